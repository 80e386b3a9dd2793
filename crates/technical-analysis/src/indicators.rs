use engine_core::Candle;
use serde::{Deserialize, Serialize};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average with smoothing factor 2/(period+1).
/// Seeded with the first value so the output stays index-aligned with the
/// input (fast and slow EMAs line up for MACD).
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push((data[i] - prev) * multiplier + prev);
    }

    result
}

/// Relative Strength Index over a rolling window of price deltas.
/// When the average loss is zero RSI is defined as 100.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut rsi_values = Vec::with_capacity(gains.len() - period + 1);
    for i in period - 1..gains.len() {
        let avg_gain: f64 = gains[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[i + 1 - period..=i].iter().sum::<f64>() / period as f64;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        };
        rsi_values.push(rsi);
    }

    rsi_values
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdResult {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || data.is_empty() {
        return MacdResult {
            macd_line: vec![],
            signal_line: vec![],
            histogram: vec![],
        };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands around an SMA, using the sample standard deviation
/// (n - 1 denominator) of each window
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    if period < 2 || data.len() < period {
        return BollingerBands {
            upper: vec![],
            middle: vec![],
            lower: vec![],
        };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for i in period - 1..data.len() {
        let slice = &data[i + 1 - period..=i];
        let mean = middle[i + 1 - period];
        let variance: f64 =
            slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        let std = variance.sqrt();

        upper.push(mean + std_dev * std);
        lower.push(mean - std_dev * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(candles.len().saturating_sub(1));
    for i in 1..candles.len() {
        let high_low = candles[i].high - candles[i].low;
        let high_close = (candles[i].high - candles[i - 1].close).abs();
        let low_close = (candles[i].low - candles[i - 1].close).abs();
        ranges.push(high_low.max(high_close).max(low_close));
    }
    ranges
}

/// Average True Range: rolling mean of the true range
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return vec![];
    }
    sma(&true_ranges(candles), period)
}

/// Stochastic Oscillator
pub struct StochasticResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> StochasticResult {
    if k_period == 0 || candles.len() < k_period {
        return StochasticResult { k: vec![], d: vec![] };
    }

    let mut k_values = Vec::with_capacity(candles.len() - k_period + 1);

    for i in k_period - 1..candles.len() {
        let slice = &candles[i + 1 - k_period..=i];
        let highest = slice.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = slice.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

        // Flat range is degenerate; report the midpoint
        let k = if highest == lowest {
            50.0
        } else {
            100.0 * (candles[i].close - lowest) / (highest - lowest)
        };

        k_values.push(k);
    }

    let d_values = sma(&k_values, d_period);

    StochasticResult {
        k: k_values,
        d: d_values,
    }
}

/// Average Directional Index from rolling-mean directional indices
pub struct AdxResult {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

pub fn adx(candles: &[Candle], period: usize) -> AdxResult {
    if period == 0 || candles.len() < period * 2 + 1 {
        return AdxResult {
            adx: vec![],
            plus_di: vec![],
            minus_di: vec![],
        };
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);

    for i in 1..candles.len() {
        plus_dm.push((candles[i].high - candles[i - 1].high).max(0.0));
        minus_dm.push((candles[i - 1].low - candles[i].low).max(0.0));
    }

    let atr_values = atr(candles, period);
    let plus_dm_avg = sma(&plus_dm, period);
    let minus_dm_avg = sma(&minus_dm, period);

    let len = atr_values
        .len()
        .min(plus_dm_avg.len())
        .min(minus_dm_avg.len());

    let mut plus_di = Vec::with_capacity(len);
    let mut minus_di = Vec::with_capacity(len);
    let mut dx_values = Vec::with_capacity(len);

    for i in 0..len {
        let tr = atr_values[i];
        let pdi = if tr > 0.0 { 100.0 * plus_dm_avg[i] / tr } else { 0.0 };
        let mdi = if tr > 0.0 { 100.0 * minus_dm_avg[i] / tr } else { 0.0 };

        plus_di.push(pdi);
        minus_di.push(mdi);

        let di_sum = pdi + mdi;
        dx_values.push(if di_sum > 0.0 {
            100.0 * (pdi - mdi).abs() / di_sum
        } else {
            0.0
        });
    }

    AdxResult {
        adx: sma(&dx_values, period),
        plus_di,
        minus_di,
    }
}

/// Current volume relative to its 20-bar rolling mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub current_volume: f64,
    pub average_volume: f64,
    pub volume_ratio: f64,
    pub high_volume: bool,
    pub low_volume: bool,
}

pub fn volume_analysis(candles: &[Candle], period: usize) -> VolumeAnalysis {
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let current_volume = volumes.last().copied().unwrap_or(0.0);
    let average_volume = sma(&volumes, period).last().copied().unwrap_or(0.0);

    let volume_ratio = if average_volume > 0.0 {
        current_volume / average_volume
    } else {
        1.0
    };

    VolumeAnalysis {
        current_volume,
        average_volume,
        volume_ratio,
        high_volume: volume_ratio > 1.5,
        low_volume: volume_ratio < 0.5,
    }
}
