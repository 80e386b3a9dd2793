use engine_core::Candle;
use serde::{Deserialize, Serialize};

/// Centered extrema window for support/resistance detection
const LEVEL_WINDOW: usize = 20;
/// Relative distance under which nearby levels merge into one
const CLUSTER_THRESHOLD: f64 = 0.02;
const TREND_PERIOD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUptrend,
    Uptrend,
    Sideways,
    Downtrend,
    StrongDowntrend,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::StrongUptrend => "strong_uptrend",
            Trend::Uptrend => "uptrend",
            Trend::Sideways => "sideways",
            Trend::Downtrend => "downtrend",
            Trend::StrongDowntrend => "strong_downtrend",
            Trend::InsufficientData => "insufficient_data",
        }
    }

    pub fn is_uptrend(&self) -> bool {
        matches!(self, Trend::StrongUptrend | Trend::Uptrend)
    }

    pub fn is_downtrend(&self) -> bool {
        matches!(self, Trend::StrongDowntrend | Trend::Downtrend)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReading {
    pub trend: Trend,
    pub strength: f64,
    pub slope: f64,
    pub normalized_slope: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Chart-level context for the fusion stage: trend, key levels, and the
/// longer-horizon reversal patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartContext {
    pub trend: TrendReading,
    pub levels: SupportResistance,
    pub double_top: bool,
    pub double_bottom: bool,
    pub head_and_shoulders: bool,
}

impl ChartContext {
    pub fn analyze(candles: &[Candle]) -> Self {
        Self {
            trend: detect_trend(candles, TREND_PERIOD),
            levels: find_support_resistance(candles, LEVEL_WINDOW),
            double_top: detect_double_top(candles, CLUSTER_THRESHOLD),
            double_bottom: detect_double_bottom(candles, CLUSTER_THRESHOLD),
            head_and_shoulders: detect_head_and_shoulders(candles),
        }
    }
}

/// Local extrema over a centered window, clustered and capped at five
/// levels per side.
pub fn find_support_resistance(candles: &[Candle], window: usize) -> SupportResistance {
    if candles.len() <= 2 * window {
        return SupportResistance::default();
    }

    let half = window / 2;
    let mut support = Vec::new();
    let mut resistance = Vec::new();

    for i in window..candles.len() - window {
        let lo = i - half;
        let hi = i + half;
        let slice = &candles[lo..hi];

        let local_min = slice.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let local_max = slice
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);

        if candles[i].low == local_min {
            support.push(candles[i].low);
        }
        if candles[i].high == local_max {
            resistance.push(candles[i].high);
        }
    }

    let mut support = cluster_levels(&support, CLUSTER_THRESHOLD);
    let mut resistance = cluster_levels(&resistance, CLUSTER_THRESHOLD);
    support.truncate(5);
    resistance.truncate(5);

    SupportResistance {
        support,
        resistance,
    }
}

/// Merge ascending levels whose relative gap to the previous level is under
/// the threshold, replacing each cluster with its mean.
pub fn cluster_levels(levels: &[f64], threshold: f64) -> Vec<f64> {
    if levels.is_empty() {
        return Vec::new();
    }

    let mut sorted = levels.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut clustered = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();

    for &level in &sorted {
        match cluster.last() {
            Some(&last) if (level - last) / last < threshold => cluster.push(level),
            Some(_) => {
                clustered.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
                cluster = vec![level];
            }
            None => cluster.push(level),
        }
    }
    if !cluster.is_empty() {
        clustered.push(cluster.iter().sum::<f64>() / cluster.len() as f64);
    }

    clustered
}

/// Least-squares fit over the last `period` closes. The slope is normalized
/// against the mean price so thresholds are percentage-based.
pub fn detect_trend(candles: &[Candle], period: usize) -> TrendReading {
    if candles.len() < period {
        return TrendReading {
            trend: Trend::InsufficientData,
            strength: 0.0,
            slope: 0.0,
            normalized_slope: 0.0,
        };
    }

    let closes: Vec<f64> = candles[candles.len() - period..]
        .iter()
        .map(|c| c.close)
        .collect();

    let n = closes.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = closes.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in closes.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };

    let normalized_slope = if y_mean != 0.0 {
        (slope / y_mean) * 100.0
    } else {
        0.0
    };

    let (trend, strength) = if normalized_slope > 0.5 {
        (Trend::StrongUptrend, (normalized_slope.abs() / 2.0).min(1.0))
    } else if normalized_slope > 0.1 {
        (Trend::Uptrend, normalized_slope.abs().min(0.7))
    } else if normalized_slope < -0.5 {
        (
            Trend::StrongDowntrend,
            (normalized_slope.abs() / 2.0).min(1.0),
        )
    } else if normalized_slope < -0.1 {
        (Trend::Downtrend, normalized_slope.abs().min(0.7))
    } else {
        (Trend::Sideways, 0.3)
    };

    TrendReading {
        trend,
        strength,
        slope,
        normalized_slope,
    }
}

fn recent_peaks(candles: &[Candle], lookback: usize, half: usize) -> Vec<(usize, f64)> {
    let start = candles.len().saturating_sub(lookback);
    let recent = &candles[start..];
    let mut peaks = Vec::new();

    for i in half..recent.len().saturating_sub(half) {
        let window = &recent[i - half..i + half];
        let max = window
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if recent[i].high == max {
            peaks.push((i, recent[i].high));
        }
    }
    peaks
}

fn recent_troughs(candles: &[Candle], lookback: usize, half: usize) -> Vec<f64> {
    let start = candles.len().saturating_sub(lookback);
    let recent = &candles[start..];
    let mut troughs = Vec::new();

    for i in half..recent.len().saturating_sub(half) {
        let window = &recent[i - half..i + half];
        let min = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        if recent[i].low == min {
            troughs.push(recent[i].low);
        }
    }
    troughs
}

/// Two similar peaks (within tolerance) over the last 50 bars
pub fn detect_double_top(candles: &[Candle], tolerance: f64) -> bool {
    if candles.len() < 50 {
        return false;
    }

    let peaks = recent_peaks(candles, 50, 10);
    if peaks.len() < 2 {
        return false;
    }

    let a = peaks[peaks.len() - 2].1;
    let b = peaks[peaks.len() - 1].1;
    (a - b).abs() / a < tolerance
}

pub fn detect_double_bottom(candles: &[Candle], tolerance: f64) -> bool {
    if candles.len() < 50 {
        return false;
    }

    let troughs = recent_troughs(candles, 50, 10);
    if troughs.len() < 2 {
        return false;
    }

    let a = troughs[troughs.len() - 2];
    let b = troughs[troughs.len() - 1];
    (a - b).abs() / a < tolerance
}

/// Simplified head and shoulders: three peaks over the last 60 bars where
/// the middle one is highest and the shoulders are within 5% of each other.
pub fn detect_head_and_shoulders(candles: &[Candle]) -> bool {
    if candles.len() < 60 {
        return false;
    }

    let peaks = recent_peaks(candles, 60, 15);
    if peaks.len() < 3 {
        return false;
    }

    let left = peaks[peaks.len() - 3].1;
    let head = peaks[peaks.len() - 2].1;
    let right = peaks[peaks.len() - 1].1;

    head > left && head > right && (left - right).abs() / left < 0.05
}
