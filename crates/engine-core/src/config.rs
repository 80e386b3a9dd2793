use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::AnalysisError;

/// Operating mode controlling whether decisions are signaled, queued,
/// or auto-executed. Validated at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutonomyLevel {
    SignalOnly,
    SemiAuto,
    FullAuto,
}

impl AutonomyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutonomyLevel::SignalOnly => "signal-only",
            AutonomyLevel::SemiAuto => "semi-auto",
            AutonomyLevel::FullAuto => "full-auto",
        }
    }
}

impl FromStr for AutonomyLevel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signal-only" => Ok(AutonomyLevel::SignalOnly),
            "semi-auto" => Ok(AutonomyLevel::SemiAuto),
            "full-auto" => Ok(AutonomyLevel::FullAuto),
            other => Err(AnalysisError::InvalidAutonomyLevel(other.to_string())),
        }
    }
}

/// Fixed category weights for the decision fusion engine.
/// Should sum to 1.0 for scores to read as fractions; the engine
/// re-normalizes regardless.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionWeights {
    pub ml_prediction: f64,
    pub technical_indicators: f64,
    pub candlestick_patterns: f64,
    pub chart_patterns: f64,
    pub volume_analysis: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            ml_prediction: 0.35,
            technical_indicators: 0.30,
            candlestick_patterns: 0.15,
            chart_patterns: 0.10,
            volume_analysis: 0.10,
        }
    }
}

/// Configuration surface consumed by the decision engine and risk gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: FusionWeights,
    pub confidence_threshold: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub trailing_stop_percent: f64,
    pub max_position_size_percent: f64,
    pub max_daily_loss_percent: f64,
    pub max_open_trades: usize,
    pub autonomy_level: AutonomyLevel,
    pub predictor_url: String,
    pub predictor_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            confidence_threshold: 0.7,
            stop_loss_percent: 2.0,
            take_profit_percent: 4.0,
            trailing_stop_percent: 1.5,
            max_position_size_percent: 10.0,
            max_daily_loss_percent: 5.0,
            max_open_trades: 5,
            autonomy_level: AutonomyLevel::SemiAuto,
            predictor_url: "http://localhost:8003".to_string(),
            predictor_timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let autonomy_raw =
            env::var("AI_AUTONOMY_LEVEL").unwrap_or_else(|_| "semi-auto".to_string());
        let autonomy_level = AutonomyLevel::from_str(&autonomy_raw)
            .with_context(|| format!("AI_AUTONOMY_LEVEL: unrecognized value '{autonomy_raw}'"))?;

        let config = Self {
            weights: FusionWeights::default(),
            confidence_threshold: env::var("PREDICTION_CONFIDENCE_THRESHOLD")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()?,
            stop_loss_percent: env::var("STOP_LOSS_PERCENT")
                .unwrap_or_else(|_| "2.0".to_string())
                .parse()?,
            take_profit_percent: env::var("TAKE_PROFIT_PERCENT")
                .unwrap_or_else(|_| "4.0".to_string())
                .parse()?,
            trailing_stop_percent: env::var("TRAILING_STOP_PERCENT")
                .unwrap_or_else(|_| "1.5".to_string())
                .parse()?,
            max_position_size_percent: env::var("MAX_POSITION_SIZE_PERCENT")
                .unwrap_or_else(|_| "10.0".to_string())
                .parse()?,
            max_daily_loss_percent: env::var("MAX_DAILY_LOSS_PERCENT")
                .unwrap_or_else(|_| "5.0".to_string())
                .parse()?,
            max_open_trades: env::var("MAX_OPEN_TRADES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            autonomy_level,
            predictor_url: env::var("ML_PRICE_PREDICTOR_URL")
                .unwrap_or_else(|_| "http://localhost:8003".to_string()),
            predictor_timeout_secs: env::var("ML_PREDICTOR_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        };

        Ok(config)
    }
}
