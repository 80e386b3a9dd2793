use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use engine_core::{
    AnalysisError, AuditSink, AutonomyLevel, Candle, DecisionLog, DecisionRecord, EngineConfig,
    OrderExecutor, OrderIntent, PredictionProvider, PredictionResult, TradeDecision, TradeSide,
};
use pattern_recognition::{candlestick, CandlestickReport, ChartContext};
use risk_manager::{
    AccountHandle, PositionSizing, RiskAssessment, RiskManager, StopLossMethod,
};
use serde::Serialize;
use technical_analysis::{IndicatorSnapshot, MIN_CANDLES};
use tracing::{error, info, warn};

use crate::autonomy::{resolve_action, TradeAction};
use crate::fusion::decide;

/// Per-trade risk budget as a percent of balance
const DEFAULT_RISK_PERCENT: f64 = 2.0;

/// Everything produced by one analysis cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleResult {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub prediction: PredictionResult,
    pub indicators: IndicatorSnapshot,
    pub candlesticks: CandlestickReport,
    pub chart: ChartContext,
    pub decision: DecisionRecord,
    /// Present when the decision proposed a trade
    pub sizing: Option<PositionSizing>,
    pub risk: Option<RiskAssessment>,
    pub action: TradeAction,
    pub autonomy_level: AutonomyLevel,
}

/// Orchestrates one full cycle: parallel signal gathering, fusion, the
/// risk gate, the autonomy policy, and the audit write.
pub struct TradingEngine {
    predictor: Arc<dyn PredictionProvider>,
    audit: Arc<dyn AuditSink>,
    executor: Arc<dyn OrderExecutor>,
    risk: RiskManager,
    config: EngineConfig,
}

impl TradingEngine {
    pub fn new(
        config: EngineConfig,
        predictor: Arc<dyn PredictionProvider>,
        audit: Arc<dyn AuditSink>,
        executor: Arc<dyn OrderExecutor>,
    ) -> Self {
        let risk = RiskManager::new(config.clone(), audit.clone());
        Self {
            predictor,
            audit,
            executor,
            risk,
            config,
        }
    }

    /// Run one analysis-and-decision cycle over the given window.
    /// The cycle is all-or-nothing: either a complete result comes back or
    /// the precondition/critical failure is reported, never partial state.
    pub async fn run_cycle(
        &self,
        symbol: &str,
        candles: &[Candle],
        account: &AccountHandle,
    ) -> Result<CycleResult, AnalysisError> {
        if candles.len() < MIN_CANDLES {
            return Err(AnalysisError::InsufficientData(format!(
                "Need at least {MIN_CANDLES} candles for an analysis cycle, got {}",
                candles.len()
            )));
        }
        let current_price = candles[candles.len() - 1].close;

        // The predictor is the only source that suspends on I/O; the two
        // local computations run on the same join point.
        let (prediction, indicators, (candlesticks, chart)) = tokio::join!(
            self.predict_with_fallback(symbol, candles, current_price),
            async { IndicatorSnapshot::compute(candles) },
            async {
                (
                    candlestick::detect_all(candles),
                    ChartContext::analyze(candles),
                )
            },
        );
        let indicators = indicators?;

        let decision = decide(
            &prediction,
            &indicators,
            &candlesticks,
            &chart,
            &indicators.volume,
            &self.config.weights,
            self.config.confidence_threshold,
        );

        let (sizing, risk) = match trade_side(decision.decision) {
            Some(side) => {
                let (sizing, assessment) = self
                    .evaluate_risk(symbol, current_price, side, indicators.atr, account)
                    .await;
                (Some(sizing), Some(assessment))
            }
            None => (None, None),
        };

        let action = resolve_action(
            self.config.autonomy_level,
            &decision,
            self.config.confidence_threshold,
        );
        // ORDER_PLACED is provisional until the risk outcome is known: a
        // blocked gate demotes it, and a HOLD has no order to place.
        let action = match (action, risk.as_ref()) {
            (TradeAction::OrderPlaced, Some(assessment)) if !assessment.allowed => {
                warn!(symbol, "risk gate rejected trade, order not placed");
                TradeAction::RiskBlocked
            }
            (TradeAction::OrderPlaced, None) => TradeAction::SignalGenerated,
            (action, _) => action,
        };

        if action == TradeAction::OrderPlaced {
            if let (Some(side), Some(sizing)) = (trade_side(decision.decision), sizing.as_ref()) {
                self.place_order(symbol, side, sizing, decision.confidence)
                    .await;
            }
        }

        self.log_decision(symbol, &decision, &candlesticks, &prediction, action)
            .await;

        info!(
            symbol,
            decision = decision.decision.as_str(),
            confidence = decision.confidence,
            action = action.as_str(),
            "analysis cycle complete"
        );

        Ok(CycleResult {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            current_price,
            prediction,
            indicators,
            candlesticks,
            chart,
            decision,
            sizing,
            risk,
            action,
            autonomy_level: self.config.autonomy_level,
        })
    }

    /// Size the proposed trade and run the composite risk gate. One lock
    /// acquisition spans both: the balance the sizer reads is the balance
    /// the checks see, and an allowed trade reserves its open-position
    /// slot before the lock is released.
    async fn evaluate_risk(
        &self,
        symbol: &str,
        entry_price: f64,
        side: TradeSide,
        atr: Option<f64>,
        account: &AccountHandle,
    ) -> (PositionSizing, RiskAssessment) {
        let stop = self
            .risk
            .stop_loss(entry_price, side, atr, StopLossMethod::Atr);

        let mut state = account.lock().await;
        let sizing = self
            .risk
            .position_size(state.balance, entry_price, stop, DEFAULT_RISK_PERCENT);

        let assessment = self
            .risk
            .should_allow_trade(symbol, sizing.position_value, &mut state)
            .await;

        (sizing, assessment)
    }

    /// ML unavailability degrades signal quality but never blocks a
    /// decision: failures and timeouts become a neutral prediction.
    async fn predict_with_fallback(
        &self,
        symbol: &str,
        candles: &[Candle],
        current_price: f64,
    ) -> PredictionResult {
        let limit = Duration::from_secs(self.config.predictor_timeout_secs);
        match tokio::time::timeout(limit, self.predictor.predict(symbol, candles)).await {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(e)) => {
                warn!(symbol, error = %e, "prediction failed, using neutral fallback");
                PredictionResult::neutral(current_price)
            }
            Err(_) => {
                warn!(symbol, "prediction timed out, using neutral fallback");
                PredictionResult::neutral(current_price)
            }
        }
    }

    /// Hand the intent to the execution collaborator. A failed placement
    /// is logged; the decision record is returned to the caller either way.
    async fn place_order(
        &self,
        symbol: &str,
        side: TradeSide,
        sizing: &PositionSizing,
        confidence: f64,
    ) {
        let intent = OrderIntent {
            symbol: symbol.to_string(),
            side,
            quantity: sizing.position_size,
            confidence,
        };

        if let Err(e) = self.executor.place_order(&intent).await {
            error!(symbol, error = %e, "order placement failed");
        }
    }

    async fn log_decision(
        &self,
        symbol: &str,
        decision: &DecisionRecord,
        candlesticks: &CandlestickReport,
        prediction: &PredictionResult,
        action: TradeAction,
    ) {
        let log = DecisionLog {
            symbol: symbol.to_string(),
            decision: decision.decision,
            confidence: decision.confidence,
            reasoning: decision.reasoning.join("\n"),
            scores: decision.scores,
            ml_predicted_change_percent: Some(prediction.predicted_change_percent),
            patterns_detected: serde_json::to_value(&candlesticks.patterns)
                .unwrap_or(serde_json::Value::Null),
            action_taken: Some(action.as_str().to_string()),
            timestamp: Utc::now(),
        };

        if let Err(e) = self.audit.log_decision(&log).await {
            warn!(symbol, error = %e, "failed to persist decision log");
        }
    }
}

fn trade_side(decision: TradeDecision) -> Option<TradeSide> {
    match decision {
        TradeDecision::Buy => Some(TradeSide::Buy),
        TradeDecision::Sell => Some(TradeSide::Sell),
        TradeDecision::Hold => None,
    }
}
