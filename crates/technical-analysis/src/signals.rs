use engine_core::{AnalysisError, Candle, TradeDecision};
use serde::{Deserialize, Serialize};

use crate::indicators::*;

/// Minimum window for signal generation. The full indicator set (SMA-200)
/// wants 200 candles; shorter windows leave the long averages unset and the
/// MA-trend signal falls back to sideways.
pub const MIN_CANDLES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    OversoldBuy,
    OverboughtSell,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaTrendSignal {
    StrongUptrend,
    StrongDowntrend,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSignal {
    Oversold,
    Overbought,
    Neutral,
}

/// Buy/sell lean of one categorical signal for the overall tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Buy,
    Sell,
    None,
}

/// Categorical sub-signals derived from the latest bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSignals {
    pub rsi: RsiSignal,
    pub macd: MacdSignal,
    pub ma_trend: MaTrendSignal,
    pub bollinger: BandSignal,
    pub stochastic: BandSignal,
}

impl IndicatorSignals {
    pub const COUNT: usize = 5;

    fn votes(&self) -> impl Iterator<Item = Vote> {
        let rsi = match self.rsi {
            RsiSignal::OversoldBuy => Vote::Buy,
            RsiSignal::OverboughtSell => Vote::Sell,
            RsiSignal::Neutral => Vote::None,
        };
        let macd = match self.macd {
            MacdSignal::Bullish => Vote::Buy,
            MacdSignal::Bearish => Vote::Sell,
        };
        // The MA-trend labels cast no vote; the trend still counts toward
        // the signal total (observed contract of the overall tally).
        let ma_trend = Vote::None;
        let band = |s: BandSignal| match s {
            BandSignal::Oversold => Vote::Buy,
            BandSignal::Overbought => Vote::Sell,
            BandSignal::Neutral => Vote::None,
        };

        [rsi, macd, ma_trend, band(self.bollinger), band(self.stochastic)].into_iter()
    }
}

/// Latest indicator values plus categorical signals and the overall lean.
/// Pure derivation: the same candle window always yields the same snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub sma_50: Option<f64>,
    pub sma_100: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub ema_50: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub adx: Option<f64>,
    pub volume: VolumeAnalysis,
    pub signals: IndicatorSignals,
    pub overall_signal: TradeDecision,
    /// Winning vote share, or 0.5 on a tie
    pub signal_strength: f64,
}

impl IndicatorSnapshot {
    pub fn compute(candles: &[Candle]) -> Result<Self, AnalysisError> {
        if candles.len() < MIN_CANDLES {
            return Err(AnalysisError::InsufficientData(format!(
                "Need at least {MIN_CANDLES} candles for signal generation, got {}",
                candles.len()
            )));
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let price = closes[closes.len() - 1];

        let sma_50 = sma(&closes, 50).last().copied();
        let sma_100 = sma(&closes, 100).last().copied();
        let sma_200 = sma(&closes, 200).last().copied();
        let ema_12 = ema(&closes, 12).last().copied();
        let ema_26 = ema(&closes, 26).last().copied();
        let ema_50 = ema(&closes, 50).last().copied();

        let rsi_last = rsi(&closes, 14).last().copied();

        let macd_result = macd(&closes, 12, 26, 9);
        let macd_last = macd_result.macd_line.last().copied();
        let macd_signal_last = macd_result.signal_line.last().copied();
        let macd_histogram_last = macd_result.histogram.last().copied();

        let bb = bollinger_bands(&closes, 20, 2.0);
        let bb_upper = bb.upper.last().copied();
        let bb_middle = bb.middle.last().copied();
        let bb_lower = bb.lower.last().copied();

        let atr_last = atr(candles, 14).last().copied();

        let stoch = stochastic(candles, 14, 3);
        let stoch_k = stoch.k.last().copied();
        let stoch_d = stoch.d.last().copied();

        let adx_last = adx(candles, 14).adx.last().copied();

        let volume = volume_analysis(candles, 20);

        let signals = IndicatorSignals {
            rsi: match rsi_last {
                Some(r) if r < 30.0 => RsiSignal::OversoldBuy,
                Some(r) if r > 70.0 => RsiSignal::OverboughtSell,
                _ => RsiSignal::Neutral,
            },
            macd: match (macd_last, macd_signal_last) {
                (Some(m), Some(s)) if m > s => MacdSignal::Bullish,
                _ => MacdSignal::Bearish,
            },
            ma_trend: match (sma_50, sma_200) {
                (Some(s50), Some(s200)) if price > s50 && s50 > s200 => {
                    MaTrendSignal::StrongUptrend
                }
                (Some(s50), Some(s200)) if price < s50 && s50 < s200 => {
                    MaTrendSignal::StrongDowntrend
                }
                _ => MaTrendSignal::Sideways,
            },
            bollinger: match (bb_lower, bb_upper) {
                (Some(lower), _) if price < lower => BandSignal::Oversold,
                (_, Some(upper)) if price > upper => BandSignal::Overbought,
                _ => BandSignal::Neutral,
            },
            stochastic: match (stoch_k, stoch_d) {
                (Some(k), Some(d)) if k < 20.0 && d < 20.0 => BandSignal::Oversold,
                (Some(k), Some(d)) if k > 80.0 && d > 80.0 => BandSignal::Overbought,
                _ => BandSignal::Neutral,
            },
        };

        let buy_votes = signals.votes().filter(|v| *v == Vote::Buy).count();
        let sell_votes = signals.votes().filter(|v| *v == Vote::Sell).count();

        let (overall_signal, signal_strength) = if buy_votes > sell_votes {
            (
                TradeDecision::Buy,
                buy_votes as f64 / IndicatorSignals::COUNT as f64,
            )
        } else if sell_votes > buy_votes {
            (
                TradeDecision::Sell,
                sell_votes as f64 / IndicatorSignals::COUNT as f64,
            )
        } else {
            (TradeDecision::Hold, 0.5)
        };

        Ok(Self {
            price,
            sma_50,
            sma_100,
            sma_200,
            ema_12,
            ema_26,
            ema_50,
            rsi: rsi_last,
            macd: macd_last,
            macd_signal: macd_signal_last,
            macd_histogram: macd_histogram_last,
            bb_upper,
            bb_middle,
            bb_lower,
            atr: atr_last,
            stoch_k,
            stoch_d,
            adx: adx_last,
            volume,
            signals,
            overall_signal,
            signal_strength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: Utc::now() - Duration::hours((closes.len() - i) as i64),
                open: close * 0.999,
                high: close * 1.001,
                low: close * 0.998,
                close,
                volume: 1_000_000.0,
            })
            .collect()
    }

    #[test]
    fn rejects_short_windows() {
        let candles = candles_from_closes(&vec![100.0; 30]);
        assert!(matches!(
            IndicatorSnapshot::compute(&candles),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn snapshot_is_deterministic() {
        // Pseudo-random but fully deterministic price path
        let closes: Vec<f64> = (0..250)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.05)
            .collect();
        let candles = candles_from_closes(&closes);

        let a = IndicatorSnapshot::compute(&candles).unwrap();
        let b = IndicatorSnapshot::compute(&candles).unwrap();

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn strong_uptrend_sets_ma_trend_and_macd() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64 * 0.5).collect();
        let snapshot = IndicatorSnapshot::compute(&candles_from_closes(&closes)).unwrap();

        assert_eq!(snapshot.signals.ma_trend, MaTrendSignal::StrongUptrend);
        assert_eq!(snapshot.signals.macd, MacdSignal::Bullish);
        assert_eq!(snapshot.rsi, Some(100.0));
    }

    #[test]
    fn short_window_leaves_long_averages_unset() {
        let closes = vec![100.0; 60];
        let snapshot = IndicatorSnapshot::compute(&candles_from_closes(&closes)).unwrap();

        assert!(snapshot.sma_200.is_none());
        assert!(snapshot.sma_50.is_some());
        // Without SMA-200 the MA trend falls back to sideways
        assert_eq!(snapshot.signals.ma_trend, MaTrendSignal::Sideways);
        assert_eq!(snapshot.signals.stochastic, BandSignal::Neutral);
    }

    #[test]
    fn hold_implies_tie_strength() {
        let closes: Vec<f64> = (0..250)
            .map(|i| 100.0 + (i as f64 * 1.3).sin() * 2.0)
            .collect();
        let snapshot = IndicatorSnapshot::compute(&candles_from_closes(&closes)).unwrap();

        if snapshot.overall_signal == TradeDecision::Hold {
            assert_eq!(snapshot.signal_strength, 0.5);
        } else {
            // Majority share of the five categorical signals
            assert!(snapshot.signal_strength >= 0.2 && snapshot.signal_strength <= 1.0);
        }
    }
}
