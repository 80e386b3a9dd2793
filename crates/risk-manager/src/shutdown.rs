use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use engine_core::{
    AccountRiskState, AnalysisError, AuditSink, OpenPositionSource, RiskEvent, RiskSeverity,
};
use tracing::{error, info, warn};

use crate::models::ShutdownStatus;

/// Kill switch for all automated trading on one account. Tripping it is
/// loud and audited; clearing it is a manual override.
pub struct EmergencyShutdown {
    audit: Arc<dyn AuditSink>,
    positions: Arc<dyn OpenPositionSource>,
    max_daily_loss_percent: f64,
    is_shutdown: AtomicBool,
}

impl EmergencyShutdown {
    pub fn new(
        audit: Arc<dyn AuditSink>,
        positions: Arc<dyn OpenPositionSource>,
        max_daily_loss_percent: f64,
    ) -> Self {
        Self {
            audit,
            positions,
            max_daily_loss_percent,
            is_shutdown: AtomicBool::new(false),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Trip the kill switch. Position enumeration failure is itself
    /// critical: a shutdown that cannot see the book is not a shutdown.
    pub async fn trigger_shutdown(&self, reason: &str) -> Result<ShutdownStatus, AnalysisError> {
        error!(reason, "EMERGENCY SHUTDOWN TRIGGERED");

        self.is_shutdown.store(true, Ordering::SeqCst);

        let event = RiskEvent {
            event_type: "EMERGENCY_SHUTDOWN".to_string(),
            severity: RiskSeverity::Critical,
            symbol: None,
            description: format!("Emergency shutdown: {reason}"),
            threshold_value: None,
            current_value: None,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.audit.log_risk_event(&event).await {
            warn!(error = %e, "failed to persist shutdown event");
        }

        let open_positions = self
            .positions
            .open_positions()
            .await
            .map_err(|e| AnalysisError::Critical(format!("cannot enumerate open positions: {e}")))?;

        info!(count = open_positions.len(), "open positions found to close");

        Ok(ShutdownStatus {
            shutdown_triggered: true,
            reason: reason.to_string(),
            timestamp: Utc::now(),
            open_positions_count: open_positions.len(),
        })
    }

    /// Shutdown reason if the account has breached twice the daily loss
    /// limit, None otherwise.
    pub fn check_shutdown_conditions(&self, state: &AccountRiskState) -> Option<String> {
        let daily_loss_percent = if state.balance > 0.0 {
            (state.daily_realized_pnl / state.balance) * 100.0
        } else {
            0.0
        };

        if daily_loss_percent <= -(self.max_daily_loss_percent * 2.0) {
            return Some(format!("Critical daily loss: {daily_loss_percent:.2}%"));
        }

        None
    }

    /// Manual override to resume trading
    pub fn reset_shutdown(&self) {
        self.is_shutdown.store(false, Ordering::SeqCst);
        info!("emergency shutdown reset");
    }
}
