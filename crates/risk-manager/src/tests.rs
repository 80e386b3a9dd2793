use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use engine_core::{
    AccountRiskState, AnalysisError, AuditSink, DecisionLog, EngineConfig, OpenPositionSource,
    Position, RiskEvent, RiskSeverity, TradeSide,
};

use crate::manager::{account_handle, RiskManager};
use crate::models::StopLossMethod;
use crate::shutdown::EmergencyShutdown;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RiskEvent>>,
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn log_decision(&self, _log: &DecisionLog) -> Result<(), AnalysisError> {
        Ok(())
    }

    async fn log_risk_event(&self, event: &RiskEvent) -> Result<(), AnalysisError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct StaticPositions {
    positions: Vec<Position>,
}

#[async_trait]
impl OpenPositionSource for StaticPositions {
    async fn open_positions(&self) -> Result<Vec<Position>, AnalysisError> {
        Ok(self.positions.clone())
    }
}

struct FailingPositions;

#[async_trait]
impl OpenPositionSource for FailingPositions {
    async fn open_positions(&self) -> Result<Vec<Position>, AnalysisError> {
        Err(AnalysisError::ExecutionError("broker offline".to_string()))
    }
}

fn manager() -> (RiskManager, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (
        RiskManager::new(EngineConfig::default(), sink.clone()),
        sink,
    )
}

fn state(balance: f64, daily_pnl: f64, open: usize) -> AccountRiskState {
    AccountRiskState {
        balance,
        daily_realized_pnl: daily_pnl,
        daily_trades_count: 3,
        open_positions_count: open,
    }
}

fn long_position(stop_loss: f64, trailing: bool) -> Position {
    Position {
        symbol: "BTCUSDT".to_string(),
        side: TradeSide::Buy,
        quantity: 0.1,
        entry_price: 100.0,
        stop_loss,
        take_profit: 104.0,
        trailing_stop: trailing,
        is_open: true,
    }
}

#[test]
fn position_size_respects_risk_budget() {
    let (manager, _) = manager();

    // Risk 2% of 10_000 = 200, stop distance 5 -> 40 units, value 4_000
    let sizing = manager.position_size(10_000.0, 100.0, 95.0, 2.0);

    assert!((sizing.position_size - 40.0).abs() < 1e-9);
    assert!((sizing.position_value - 4_000.0).abs() < 1e-9);
    assert!((sizing.risk_amount - 200.0).abs() < 1e-9);
    assert!((sizing.risk_percent - 2.0).abs() < 1e-9);
    assert!(!sizing.capped);
}

#[test]
fn position_size_caps_at_max_position_value() {
    let (manager, _) = manager();

    // Tight stop would size 100 units (value 10_000); cap is 10% = 1_000
    let sizing = manager.position_size(10_000.0, 100.0, 98.0, 2.0);

    assert!(sizing.capped);
    assert!((sizing.position_value - 1_000.0).abs() < 1e-9);
    assert!((sizing.position_size - 10.0).abs() < 1e-9);
    // Effective risk shrinks with the position
    assert!((sizing.risk_percent - 0.2).abs() < 1e-9);
    assert!(sizing.risk_percent < 2.0);
}

#[test]
fn position_size_zero_stop_distance_sizes_zero() {
    let (manager, _) = manager();

    let sizing = manager.position_size(10_000.0, 100.0, 100.0, 2.0);

    assert_eq!(sizing.position_size, 0.0);
    assert_eq!(sizing.position_value, 0.0);
    assert!(!sizing.capped);
}

#[test]
fn stop_loss_fixed_and_atr_methods() {
    let (manager, _) = manager();

    // 2% fixed default
    assert!((manager.stop_loss(100.0, TradeSide::Buy, None, StopLossMethod::Fixed) - 98.0).abs() < 1e-9);
    assert!((manager.stop_loss(100.0, TradeSide::Sell, None, StopLossMethod::Fixed) - 102.0).abs() < 1e-9);

    // 2x ATR
    assert!((manager.stop_loss(100.0, TradeSide::Buy, Some(1.5), StopLossMethod::Atr) - 97.0).abs() < 1e-9);
    assert!((manager.stop_loss(100.0, TradeSide::Sell, Some(1.5), StopLossMethod::Atr) - 103.0).abs() < 1e-9);

    // ATR requested but unavailable falls back to fixed
    assert!((manager.stop_loss(100.0, TradeSide::Buy, None, StopLossMethod::Atr) - 98.0).abs() < 1e-9);

    // Trailing stops start at the fixed level
    assert!((manager.stop_loss(100.0, TradeSide::Buy, None, StopLossMethod::Trailing) - 98.0).abs() < 1e-9);
}

#[test]
fn stop_loss_method_parse_falls_back_to_fixed() {
    assert_eq!(StopLossMethod::from_name("atr"), StopLossMethod::Atr);
    assert_eq!(StopLossMethod::from_name("trailing"), StopLossMethod::Trailing);
    assert_eq!(StopLossMethod::from_name("fixed"), StopLossMethod::Fixed);
    assert_eq!(StopLossMethod::from_name("garbage"), StopLossMethod::Fixed);
}

#[test]
fn take_profit_uses_fixed_percent() {
    let (manager, _) = manager();

    // 4% default target on both sides
    assert!((manager.take_profit(100.0, TradeSide::Buy, 2.0) - 104.0).abs() < 1e-9);
    assert!((manager.take_profit(100.0, TradeSide::Sell, 2.0) - 96.0).abs() < 1e-9);
}

#[test]
fn trailing_stop_only_tightens() {
    let (manager, _) = manager();
    let position = long_position(98.0, true);

    // Price up: 101 * 0.985 = 99.485 beats 98.0
    let updated = manager.trailing_stop_update(&position, 101.0);
    assert!(updated.is_some());
    assert!((updated.unwrap() - 99.485).abs() < 1e-9);

    // Price down: candidate stop is below the current one, no update
    assert!(manager.trailing_stop_update(&position, 99.0).is_none());
}

#[test]
fn trailing_stop_disabled_never_updates() {
    let (manager, _) = manager();
    let position = long_position(98.0, false);

    assert!(manager.trailing_stop_update(&position, 150.0).is_none());
}

#[test]
fn trailing_stop_short_side_trails_down() {
    let (manager, _) = manager();
    let mut position = long_position(102.0, true);
    position.side = TradeSide::Sell;

    // Price falls: 99 * 1.015 = 100.485 beats 102.0 for a short
    let updated = manager.trailing_stop_update(&position, 99.0);
    assert!(updated.is_some());
    assert!(updated.unwrap() < position.stop_loss);

    // Price rises: no loosening
    assert!(manager.trailing_stop_update(&position, 103.0).is_none());
}

#[tokio::test]
async fn daily_loss_breach_emits_critical_event() {
    let (manager, sink) = manager();

    // -600 on 10_000 = -6%, limit is 5%
    let check = manager.check_daily_loss(&state(10_000.0, -600.0, 0)).await;

    assert!(check.limit_reached);
    assert!((check.daily_loss_percent + 6.0).abs() < 1e-9);

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "MAX_DAILY_LOSS");
    assert_eq!(events[0].severity, RiskSeverity::Critical);
}

#[tokio::test]
async fn daily_loss_within_limit_emits_nothing() {
    let (manager, sink) = manager();

    let check = manager.check_daily_loss(&state(10_000.0, -100.0, 0)).await;

    assert!(!check.limit_reached);
    assert!(sink.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn daily_loss_zero_balance_is_neutral() {
    let (manager, _) = manager();

    let check = manager.check_daily_loss(&state(0.0, -500.0, 0)).await;

    assert!(!check.limit_reached);
    assert_eq!(check.daily_loss_percent, 0.0);
}

#[tokio::test]
async fn open_trades_limit_and_slots() {
    let (manager, sink) = manager();

    let check = manager
        .check_max_open_trades(&state(10_000.0, 0.0, 6))
        .await;
    assert!(check.limit_reached);
    assert_eq!(check.available_slots, 0);
    assert_eq!(sink.events.lock().unwrap()[0].severity, RiskSeverity::High);

    let check = manager
        .check_max_open_trades(&state(10_000.0, 0.0, 3))
        .await;
    assert!(!check.limit_reached);
    assert_eq!(check.available_slots, 2);
}

#[tokio::test]
async fn position_size_check_flags_oversized_value() {
    let (manager, sink) = manager();

    let check = manager
        .check_position_size("BTCUSDT", 1_500.0, 10_000.0)
        .await;

    assert!(check.exceeds_limit);
    assert!((check.max_position_value - 1_000.0).abs() < 1e-9);
    assert!((check.position_percent - 15.0).abs() < 1e-9);

    let events = sink.events.lock().unwrap();
    assert_eq!(events[0].event_type, "POSITION_SIZE_LIMIT");
    assert_eq!(events[0].severity, RiskSeverity::Medium);
    assert_eq!(events[0].symbol.as_deref(), Some("BTCUSDT"));
}

#[tokio::test]
async fn should_allow_trade_passes_and_reserves_slot() {
    let (manager, _) = manager();
    let account = account_handle(state(10_000.0, -100.0, 2));

    let mut guard = account.lock().await;
    let assessment = manager.should_allow_trade("BTCUSDT", 500.0, &mut guard).await;

    assert!(assessment.allowed);
    assert!(assessment.failed_checks.is_empty());
    // The allowed trade claims its slot before the lock is released
    assert_eq!(guard.open_positions_count, 3);
}

#[tokio::test]
async fn should_allow_trade_collects_all_failures() {
    let (manager, _) = manager();
    let account = account_handle(state(10_000.0, -600.0, 6));

    let mut guard = account.lock().await;
    let assessment = manager
        .should_allow_trade("BTCUSDT", 1_500.0, &mut guard)
        .await;

    assert!(!assessment.allowed);
    let names: Vec<&str> = assessment.failed_checks.iter().map(|c| c.check).collect();
    assert_eq!(
        names,
        vec!["daily_loss_limit", "max_open_trades", "position_size"]
    );
    // A rejected trade reserves nothing
    assert_eq!(guard.open_positions_count, 6);
}

#[tokio::test]
async fn concurrent_proposals_cannot_share_the_last_slot() {
    let (manager, _) = manager();
    let account = account_handle(state(10_000.0, 0.0, 4));

    let (first, second) = tokio::join!(
        async {
            let mut guard = account.lock().await;
            manager.should_allow_trade("BTCUSDT", 500.0, &mut guard).await
        },
        async {
            let mut guard = account.lock().await;
            manager.should_allow_trade("ETHUSDT", 500.0, &mut guard).await
        },
    );

    // Exactly one proposal wins the last open-trade slot
    assert!(first.allowed ^ second.allowed);
    assert_eq!(account.lock().await.open_positions_count, 5);
}

#[tokio::test]
async fn shutdown_trigger_counts_open_positions() {
    let sink = Arc::new(RecordingSink::default());
    let positions = Arc::new(StaticPositions {
        positions: vec![long_position(98.0, false), long_position(97.0, true)],
    });
    let shutdown = EmergencyShutdown::new(sink.clone(), positions, 5.0);

    let status = shutdown.trigger_shutdown("manual test").await.unwrap();

    assert!(status.shutdown_triggered);
    assert_eq!(status.open_positions_count, 2);
    assert!(shutdown.is_shutdown());

    let events = sink.events.lock().unwrap();
    assert_eq!(events[0].event_type, "EMERGENCY_SHUTDOWN");
    assert_eq!(events[0].severity, RiskSeverity::Critical);

    drop(events);
    shutdown.reset_shutdown();
    assert!(!shutdown.is_shutdown());
}

#[tokio::test]
async fn shutdown_surfaces_position_enumeration_failure() {
    let sink = Arc::new(RecordingSink::default());
    let shutdown = EmergencyShutdown::new(sink, Arc::new(FailingPositions), 5.0);

    let result = shutdown.trigger_shutdown("manual test").await;

    assert!(matches!(result, Err(AnalysisError::Critical(_))));
    // The switch still trips even when enumeration fails
    assert!(shutdown.is_shutdown());
}

#[test]
fn shutdown_conditions_require_double_the_daily_limit() {
    let sink = Arc::new(RecordingSink::default());
    let positions = Arc::new(StaticPositions { positions: vec![] });
    let shutdown = EmergencyShutdown::new(sink, positions, 5.0);

    // -6% breaches the limit but not 2x the limit
    assert!(shutdown
        .check_shutdown_conditions(&state(10_000.0, -600.0, 0))
        .is_none());

    let reason = shutdown
        .check_shutdown_conditions(&state(10_000.0, -1_000.0, 0))
        .unwrap();
    assert!(reason.contains("-10.00%"));
}
