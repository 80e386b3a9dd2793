use engine_core::{AutonomyLevel, DecisionRecord};
use serde::{Deserialize, Serialize};

/// Action token produced for one decision under the active autonomy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    SignalGenerated,
    QueuedForApproval,
    OrderPlaced,
    IgnoredLowConfidence,
    /// Full-auto order stopped by the risk gate
    RiskBlocked,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::SignalGenerated => "SIGNAL_GENERATED",
            TradeAction::QueuedForApproval => "QUEUED_FOR_APPROVAL",
            TradeAction::OrderPlaced => "ORDER_PLACED",
            TradeAction::IgnoredLowConfidence => "IGNORED_LOW_CONFIDENCE",
            TradeAction::RiskBlocked => "RISK_BLOCKED",
        }
    }
}

/// Pure mapping from {decision, autonomy level} to a provisional action
/// token. ORDER_PLACED is confirmed or demoted by the engine once the risk
/// outcome is known; the other levels stop at signaling or queueing.
pub fn resolve_action(
    level: AutonomyLevel,
    decision: &DecisionRecord,
    confidence_threshold: f64,
) -> TradeAction {
    match level {
        AutonomyLevel::SignalOnly => TradeAction::SignalGenerated,
        AutonomyLevel::SemiAuto => TradeAction::QueuedForApproval,
        AutonomyLevel::FullAuto => {
            if decision.confidence >= confidence_threshold {
                TradeAction::OrderPlaced
            } else {
                TradeAction::IgnoredLowConfidence
            }
        }
    }
}
