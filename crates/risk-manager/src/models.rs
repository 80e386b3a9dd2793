use serde::{Deserialize, Serialize};

/// Stop-loss placement method. Unrecognized names fall back to `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLossMethod {
    Fixed,
    Atr,
    Trailing,
}

impl StopLossMethod {
    pub fn from_name(name: &str) -> Self {
        match name {
            "atr" => StopLossMethod::Atr,
            "trailing" => StopLossMethod::Trailing,
            _ => StopLossMethod::Fixed,
        }
    }
}

/// Risk-based position sizing result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizing {
    pub position_size: f64,
    pub position_value: f64,
    pub risk_amount: f64,
    /// Effective risk percent after any cap
    pub risk_percent: f64,
    /// True when the max-position-size cap reduced the raw size
    pub capped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLossCheck {
    pub limit_reached: bool,
    pub daily_pnl: f64,
    pub daily_loss_percent: f64,
    pub max_daily_loss_percent: f64,
    pub trades_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTradesCheck {
    pub limit_reached: bool,
    pub open_trades_count: usize,
    pub max_open_trades: usize,
    pub available_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizeCheck {
    pub exceeds_limit: bool,
    pub position_value: f64,
    pub max_position_value: f64,
    pub position_percent: f64,
}

/// One failed gate with a human-readable reason
#[derive(Debug, Clone, Serialize)]
pub struct FailedCheck {
    pub check: &'static str,
    pub reason: String,
}

/// Composite outcome of the risk gate for one proposed trade
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub allowed: bool,
    pub failed_checks: Vec<FailedCheck>,
    pub daily_loss: DailyLossCheck,
    pub open_trades: OpenTradesCheck,
    pub position_size: PositionSizeCheck,
}

/// Result of an emergency shutdown trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownStatus {
    pub shutdown_triggered: bool,
    pub reason: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub open_positions_count: usize,
}
