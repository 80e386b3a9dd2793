use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Final directional decision for one analysis cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDecision {
    Buy,
    Sell,
    Hold,
}

impl TradeDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDecision::Buy => "BUY",
            TradeDecision::Sell => "SELL",
            TradeDecision::Hold => "HOLD",
        }
    }
}

/// Predicted price direction from the external predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Unknown,
}

/// Output contract of the external price predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub current_price: f64,
    pub predicted_price: f64,
    pub predicted_change_percent: f64,
    pub direction: Direction,
    /// 0.0 to 1.0
    pub confidence: f64,
}

impl PredictionResult {
    /// Neutral fallback used when the predictor is unavailable.
    /// Degrades signal quality but never blocks a decision.
    pub fn neutral(current_price: f64) -> Self {
        Self {
            current_price,
            predicted_price: current_price,
            predicted_change_percent: 0.0,
            direction: Direction::Unknown,
            confidence: 0.0,
        }
    }
}

/// Per-class scores, normalized to sum to 1 when any source fired
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassScores {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl ClassScores {
    pub fn total(&self) -> f64 {
        self.buy + self.sell + self.hold
    }

    /// Winning class and its score. Ties resolve in Buy, Sell, Hold order.
    pub fn winner(&self) -> (TradeDecision, f64) {
        let mut best = (TradeDecision::Buy, self.buy);
        if self.sell > best.1 {
            best = (TradeDecision::Sell, self.sell);
        }
        if self.hold > best.1 {
            best = (TradeDecision::Hold, self.hold);
        }
        best
    }
}

/// Condensed view of the signals that contributed to a decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSummary {
    pub ml_direction: Direction,
    pub technical_signal: TradeDecision,
    pub trend: String,
    pub patterns_bullish: usize,
    pub patterns_bearish: usize,
}

/// Fused decision with scores and an ordered reasoning trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: TradeDecision,
    /// Winning normalized score
    pub confidence: f64,
    pub scores: ClassScores,
    pub reasoning: Vec<String>,
    pub summary: SignalSummary,
}

/// An open or closed position, owned by the execution/persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: bool,
    pub is_open: bool,
}

/// Per-account risk aggregates, read under the account lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRiskState {
    pub balance: f64,
    /// Realized P&L of positions closed since the start of the current UTC day
    pub daily_realized_pnl: f64,
    /// Number of trades closed today
    pub daily_trades_count: usize,
    pub open_positions_count: usize,
}

/// Severity of a risk event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskSeverity {
    Medium,
    High,
    Critical,
}

/// Audit record emitted on any risk check breach or shutdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvent {
    pub event_type: String,
    pub severity: RiskSeverity,
    pub symbol: Option<String>,
    pub description: String,
    pub threshold_value: Option<f64>,
    pub current_value: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Full decision audit record handed to the audit sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLog {
    pub symbol: String,
    pub decision: TradeDecision,
    pub confidence: f64,
    pub reasoning: String,
    pub scores: ClassScores,
    pub ml_predicted_change_percent: Option<f64>,
    pub patterns_detected: serde_json::Value,
    pub action_taken: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Execution-intent record produced by the autonomy policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub confidence: f64,
}
