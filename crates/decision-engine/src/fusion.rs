use engine_core::{
    ClassScores, DecisionRecord, Direction, FusionWeights, PredictionResult, SignalSummary,
    TradeDecision,
};
use pattern_recognition::{CandlestickReport, ChartContext};
use technical_analysis::{IndicatorSnapshot, VolumeAnalysis};

/// Immutable scoring accumulator. Each source folds a contribution and its
/// reasoning line into a new tally, so score order and reasoning order are
/// fixed by construction.
#[derive(Debug, Clone, Default)]
struct Tally {
    scores: ClassScores,
    reasoning: Vec<String>,
}

impl Tally {
    fn add(self, class: TradeDecision, amount: f64, line: String) -> Self {
        let mut next = self.add_silent(class, amount);
        next.reasoning.push(line);
        next
    }

    fn add_silent(mut self, class: TradeDecision, amount: f64) -> Self {
        match class {
            TradeDecision::Buy => self.scores.buy += amount,
            TradeDecision::Sell => self.scores.sell += amount,
            TradeDecision::Hold => self.scores.hold += amount,
        }
        self
    }
}

/// Fuse the three signal sources into one decision record.
///
/// Scoring is additive in a fixed order: ML, technical, candlestick, chart
/// trend, double bottom/top, volume confirmation. The volume step reads the
/// running totals, so it rewards whichever side the earlier sources already
/// put ahead. Scores are normalized to fractions when anything fired, and
/// the confidence gate overrides the winner to HOLD below the threshold.
pub fn decide(
    ml: &PredictionResult,
    technical: &IndicatorSnapshot,
    candlesticks: &CandlestickReport,
    chart: &ChartContext,
    volume: &VolumeAnalysis,
    weights: &FusionWeights,
    confidence_threshold: f64,
) -> DecisionRecord {
    let tally = Tally::default();

    // 1. ML prediction
    let tally = match ml.direction {
        Direction::Up => tally.add(
            TradeDecision::Buy,
            weights.ml_prediction * ml.confidence,
            format!(
                "ML predicts {:.2}% increase (conf: {:.2})",
                ml.predicted_change_percent, ml.confidence
            ),
        ),
        Direction::Down => tally.add(
            TradeDecision::Sell,
            weights.ml_prediction * ml.confidence,
            format!(
                "ML predicts {:.2}% decrease (conf: {:.2})",
                ml.predicted_change_percent, ml.confidence
            ),
        ),
        Direction::Unknown => tally,
    };

    // 2. Technical indicators. A HOLD lean adds the full weight, unscaled.
    let tally = match technical.overall_signal {
        TradeDecision::Buy => tally.add(
            TradeDecision::Buy,
            weights.technical_indicators * technical.signal_strength,
            format!(
                "Technical indicators suggest BUY (strength: {:.2})",
                technical.signal_strength
            ),
        ),
        TradeDecision::Sell => tally.add(
            TradeDecision::Sell,
            weights.technical_indicators * technical.signal_strength,
            format!(
                "Technical indicators suggest SELL (strength: {:.2})",
                technical.signal_strength
            ),
        ),
        TradeDecision::Hold => tally.add_silent(TradeDecision::Hold, weights.technical_indicators),
    };

    // 3. Candlestick patterns. 0.1 per pattern on the winning side, capped
    // at the category weight; a tie contributes nothing.
    let bullish = candlesticks.bullish_count;
    let bearish = candlesticks.bearish_count;
    let tally = if bullish > bearish {
        tally.add(
            TradeDecision::Buy,
            (bullish as f64 * 0.1).min(weights.candlestick_patterns),
            format!("Detected {bullish} bullish candlestick patterns"),
        )
    } else if bearish > bullish {
        tally.add(
            TradeDecision::Sell,
            (bearish as f64 * 0.1).min(weights.candlestick_patterns),
            format!("Detected {bearish} bearish candlestick patterns"),
        )
    } else {
        tally
    };

    // 4. Chart trend, then the flat reversal-pattern bonuses. The bonuses
    // are independent of the category weight and can push the raw total
    // above 1 before normalization.
    let trend = chart.trend.trend;
    let tally = if trend.is_uptrend() {
        tally.add(
            TradeDecision::Buy,
            weights.chart_patterns * chart.trend.strength,
            format!(
                "Chart shows {} (strength: {:.2})",
                trend.as_str(),
                chart.trend.strength
            ),
        )
    } else if trend.is_downtrend() {
        tally.add(
            TradeDecision::Sell,
            weights.chart_patterns * chart.trend.strength,
            format!(
                "Chart shows {} (strength: {:.2})",
                trend.as_str(),
                chart.trend.strength
            ),
        )
    } else {
        tally
    };

    let tally = if chart.double_bottom {
        tally.add(
            TradeDecision::Buy,
            0.05,
            "Double bottom pattern detected (bullish)".to_string(),
        )
    } else {
        tally
    };
    let tally = if chart.double_top {
        tally.add(
            TradeDecision::Sell,
            0.05,
            "Double top pattern detected (bearish)".to_string(),
        )
    } else {
        tally
    };

    // 5. Volume confirms only a strictly leading side
    let tally = if volume.high_volume {
        if tally.scores.buy > tally.scores.sell {
            tally.add(
                TradeDecision::Buy,
                weights.volume_analysis,
                "High volume confirms bullish sentiment".to_string(),
            )
        } else if tally.scores.sell > tally.scores.buy {
            tally.add(
                TradeDecision::Sell,
                weights.volume_analysis,
                "High volume confirms bearish sentiment".to_string(),
            )
        } else {
            tally
        }
    } else {
        tally
    };

    let Tally {
        mut scores,
        reasoning,
    } = tally;

    let total = scores.total();
    if total > 0.0 {
        scores.buy /= total;
        scores.sell /= total;
        scores.hold /= total;
    }

    let summary = SignalSummary {
        ml_direction: ml.direction,
        technical_signal: technical.overall_signal,
        trend: trend.as_str().to_string(),
        patterns_bullish: bullish,
        patterns_bearish: bearish,
    };

    if total <= 0.0 {
        return DecisionRecord {
            decision: TradeDecision::Hold,
            confidence: 0.0,
            scores,
            reasoning,
            summary,
        };
    }

    let (winner, confidence) = scores.winner();
    let (decision, reasoning) = if confidence < confidence_threshold {
        let mut reasoning = reasoning;
        reasoning.push(format!(
            "Confidence {confidence:.2} below threshold {confidence_threshold}"
        ));
        (TradeDecision::Hold, reasoning)
    } else {
        (winner, reasoning)
    };

    DecisionRecord {
        decision,
        confidence,
        scores,
        reasoning,
        summary,
    }
}
