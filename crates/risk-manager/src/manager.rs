use std::sync::Arc;

use chrono::Utc;
use engine_core::{
    AccountRiskState, AuditSink, EngineConfig, Position, RiskEvent, RiskSeverity, TradeSide,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::*;

/// Shared, lock-guarded risk state for one account. Callers hold the lock
/// across one whole evaluate-then-reserve sequence, so two concurrent
/// proposals can never both claim the same capacity.
pub type AccountHandle = Arc<Mutex<AccountRiskState>>;

pub fn account_handle(state: AccountRiskState) -> AccountHandle {
    Arc::new(Mutex::new(state))
}

/// Pre-trade risk gate: sizing, protective levels, and account-level limits
pub struct RiskManager {
    config: EngineConfig,
    audit: Arc<dyn AuditSink>,
}

impl RiskManager {
    pub fn new(config: EngineConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { config, audit }
    }

    /// Size a position so that the stop-loss distance risks at most
    /// `risk_percent` of the balance, then cap by max position value.
    pub fn position_size(
        &self,
        account_balance: f64,
        entry_price: f64,
        stop_loss_price: f64,
        risk_percent: f64,
    ) -> PositionSizing {
        let risk_per_unit = (entry_price - stop_loss_price).abs();
        let max_risk_amount = account_balance * (risk_percent / 100.0);

        let mut position_size = if risk_per_unit > 0.0 {
            max_risk_amount / risk_per_unit
        } else {
            0.0
        };
        let mut position_value = position_size * entry_price;

        let max_position_value =
            account_balance * (self.config.max_position_size_percent / 100.0);

        let capped = position_value > max_position_value;
        let actual_risk_percent = if capped {
            position_size = max_position_value / entry_price;
            position_value = max_position_value;
            (position_size * risk_per_unit / account_balance) * 100.0
        } else {
            risk_percent
        };

        PositionSizing {
            position_size,
            position_value,
            risk_amount: position_size * risk_per_unit,
            risk_percent: actual_risk_percent,
            capped,
        }
    }

    /// Stop-loss price for an entry. ATR placement uses 2x ATR and falls
    /// back to the fixed percent when no ATR is available; trailing stops
    /// start at the fixed level and only move via `trailing_stop_update`.
    pub fn stop_loss(
        &self,
        entry_price: f64,
        side: TradeSide,
        atr: Option<f64>,
        method: StopLossMethod,
    ) -> f64 {
        let fixed = |pct: f64| match side {
            TradeSide::Buy => entry_price * (1.0 - pct / 100.0),
            TradeSide::Sell => entry_price * (1.0 + pct / 100.0),
        };

        match (method, atr) {
            (StopLossMethod::Atr, Some(atr)) => match side {
                TradeSide::Buy => entry_price - 2.0 * atr,
                TradeSide::Sell => entry_price + 2.0 * atr,
            },
            _ => fixed(self.config.stop_loss_percent),
        }
    }

    /// Take-profit price at the configured fixed percent from entry.
    /// The risk-reward ratio is part of the call contract but the percent
    /// target takes precedence.
    pub fn take_profit(&self, entry_price: f64, side: TradeSide, _risk_reward_ratio: f64) -> f64 {
        match side {
            TradeSide::Buy => entry_price * (1.0 + self.config.take_profit_percent / 100.0),
            TradeSide::Sell => entry_price * (1.0 - self.config.take_profit_percent / 100.0),
        }
    }

    /// New trailing-stop price if the market has moved favorably enough to
    /// improve on the current stop. Stops only tighten, never loosen.
    pub fn trailing_stop_update(&self, position: &Position, current_price: f64) -> Option<f64> {
        if !position.trailing_stop {
            return None;
        }

        let trailing = self.config.trailing_stop_percent / 100.0;

        match position.side {
            TradeSide::Buy => {
                let new_stop = current_price * (1.0 - trailing);
                (new_stop > position.stop_loss).then_some(new_stop)
            }
            TradeSide::Sell => {
                let new_stop = current_price * (1.0 + trailing);
                (new_stop < position.stop_loss).then_some(new_stop)
            }
        }
    }

    pub async fn check_daily_loss(&self, state: &AccountRiskState) -> DailyLossCheck {
        let daily_loss_percent = if state.balance > 0.0 {
            (state.daily_realized_pnl / state.balance) * 100.0
        } else {
            0.0
        };

        let limit_reached = daily_loss_percent <= -self.config.max_daily_loss_percent;

        if limit_reached {
            self.emit_event(RiskEvent {
                event_type: "MAX_DAILY_LOSS".to_string(),
                severity: RiskSeverity::Critical,
                symbol: None,
                description: format!("Daily loss limit reached: {daily_loss_percent:.2}%"),
                threshold_value: Some(self.config.max_daily_loss_percent),
                current_value: Some(daily_loss_percent.abs()),
                timestamp: Utc::now(),
            })
            .await;
        }

        DailyLossCheck {
            limit_reached,
            daily_pnl: state.daily_realized_pnl,
            daily_loss_percent,
            max_daily_loss_percent: self.config.max_daily_loss_percent,
            trades_count: state.daily_trades_count,
        }
    }

    pub async fn check_max_open_trades(&self, state: &AccountRiskState) -> OpenTradesCheck {
        let open_trades_count = state.open_positions_count;
        let limit_reached = open_trades_count >= self.config.max_open_trades;

        if limit_reached {
            self.emit_event(RiskEvent {
                event_type: "MAX_OPEN_TRADES".to_string(),
                severity: RiskSeverity::High,
                symbol: None,
                description: format!("Maximum open trades reached: {open_trades_count}"),
                threshold_value: Some(self.config.max_open_trades as f64),
                current_value: Some(open_trades_count as f64),
                timestamp: Utc::now(),
            })
            .await;
        }

        OpenTradesCheck {
            limit_reached,
            open_trades_count,
            max_open_trades: self.config.max_open_trades,
            available_slots: self.config.max_open_trades.saturating_sub(open_trades_count),
        }
    }

    pub async fn check_position_size(
        &self,
        symbol: &str,
        position_value: f64,
        account_balance: f64,
    ) -> PositionSizeCheck {
        let max_position_value =
            account_balance * (self.config.max_position_size_percent / 100.0);
        let exceeds_limit = position_value > max_position_value;

        if exceeds_limit {
            self.emit_event(RiskEvent {
                event_type: "POSITION_SIZE_LIMIT".to_string(),
                severity: RiskSeverity::Medium,
                symbol: Some(symbol.to_string()),
                description: format!("Position size exceeds limit for {symbol}"),
                threshold_value: Some(max_position_value),
                current_value: Some(position_value),
                timestamp: Utc::now(),
            })
            .await;
        }

        PositionSizeCheck {
            exceeds_limit,
            position_value,
            max_position_value,
            position_percent: if account_balance > 0.0 {
                position_value / account_balance * 100.0
            } else {
                0.0
            },
        }
    }

    /// Composite pre-trade gate over caller-locked account state. All
    /// three checks read the same state, and an allowed trade reserves its
    /// open-position slot before the caller releases the lock.
    pub async fn should_allow_trade(
        &self,
        symbol: &str,
        position_value: f64,
        state: &mut AccountRiskState,
    ) -> RiskAssessment {
        let daily_loss = self.check_daily_loss(state).await;
        let open_trades = self.check_max_open_trades(state).await;
        let position_size = self
            .check_position_size(symbol, position_value, state.balance)
            .await;

        let mut failed_checks = Vec::new();

        if daily_loss.limit_reached {
            failed_checks.push(FailedCheck {
                check: "daily_loss_limit",
                reason: format!(
                    "Daily loss limit reached: {:.2}%",
                    daily_loss.daily_loss_percent
                ),
            });
        }
        if open_trades.limit_reached {
            failed_checks.push(FailedCheck {
                check: "max_open_trades",
                reason: format!(
                    "Maximum open trades reached: {}",
                    open_trades.open_trades_count
                ),
            });
        }
        if position_size.exceeds_limit {
            failed_checks.push(FailedCheck {
                check: "position_size",
                reason: format!(
                    "Position size exceeds {}% of account",
                    self.config.max_position_size_percent
                ),
            });
        }

        let allowed = failed_checks.is_empty();
        if allowed {
            state.open_positions_count += 1;
        }

        RiskAssessment {
            allowed,
            failed_checks,
            daily_loss,
            open_trades,
            position_size,
        }
    }

    /// Audit writes are fire-and-forget: a failed write must never block
    /// or fail a risk check.
    async fn emit_event(&self, event: RiskEvent) {
        warn!(
            event_type = %event.event_type,
            description = %event.description,
            "risk event"
        );
        if let Err(e) = self.audit.log_risk_event(&event).await {
            warn!(error = %e, "failed to persist risk event");
        }
    }
}
