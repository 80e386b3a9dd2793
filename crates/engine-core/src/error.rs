use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid autonomy level: {0}")]
    InvalidAutonomyLevel(String),

    #[error("Prediction error: {0}")]
    PredictionError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Failures that risk uncontrolled exposure (e.g. emergency shutdown
    /// unable to enumerate open positions). Must not be swallowed.
    #[error("Critical: {0}")]
    Critical(String),
}
