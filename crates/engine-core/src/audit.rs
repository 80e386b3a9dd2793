use async_trait::async_trait;
use tracing::{info, warn};

use crate::{AnalysisError, AuditSink, DecisionLog, RiskEvent};

/// Audit sink backed by the tracing subscriber. The default when no
/// persistent sink is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_decision(&self, log: &DecisionLog) -> Result<(), AnalysisError> {
        info!(
            symbol = %log.symbol,
            decision = log.decision.as_str(),
            confidence = log.confidence,
            action = log.action_taken.as_deref().unwrap_or("-"),
            "decision recorded"
        );
        Ok(())
    }

    async fn log_risk_event(&self, event: &RiskEvent) -> Result<(), AnalysisError> {
        warn!(
            event_type = %event.event_type,
            severity = ?event.severity,
            symbol = event.symbol.as_deref().unwrap_or("-"),
            description = %event.description,
            "risk event recorded"
        );
        Ok(())
    }
}
