use async_trait::async_trait;

use crate::{
    AnalysisError, Candle, DecisionLog, OrderIntent, Position, PredictionResult, RiskEvent,
};

/// External price-direction predictor. Implementations must tolerate being
/// called with the same window handed to the indicator engine.
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    async fn predict(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<PredictionResult, AnalysisError>;
}

/// Persistence/audit collaborator. Writes are fire-and-forget from the
/// engine's perspective: a failed write is logged, never propagated.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_decision(&self, log: &DecisionLog) -> Result<(), AnalysisError>;
    async fn log_risk_event(&self, event: &RiskEvent) -> Result<(), AnalysisError>;
}

/// Execution collaborator, invoked only by the full-auto ORDER_PLACED branch.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn place_order(&self, intent: &OrderIntent) -> Result<(), AnalysisError>;
}

/// Source of currently open positions for an account.
#[async_trait]
pub trait OpenPositionSource: Send + Sync {
    async fn open_positions(&self) -> Result<Vec<Position>, AnalysisError>;
}
