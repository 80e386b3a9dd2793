use engine_core::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlestickPattern {
    Doji,
    Hammer,
    InvertedHammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStrength {
    Medium,
    Strong,
    VeryStrong,
}

impl CandlestickPattern {
    pub fn name(&self) -> &'static str {
        match self {
            CandlestickPattern::Doji => "Doji",
            CandlestickPattern::Hammer => "Hammer",
            CandlestickPattern::InvertedHammer => "Inverted Hammer",
            CandlestickPattern::ShootingStar => "Shooting Star",
            CandlestickPattern::BullishEngulfing => "Bullish Engulfing",
            CandlestickPattern::BearishEngulfing => "Bearish Engulfing",
            CandlestickPattern::MorningStar => "Morning Star",
            CandlestickPattern::EveningStar => "Evening Star",
        }
    }

    pub fn category(&self) -> PatternCategory {
        match self {
            CandlestickPattern::Doji => PatternCategory::Neutral,
            CandlestickPattern::Hammer
            | CandlestickPattern::InvertedHammer
            | CandlestickPattern::BullishEngulfing
            | CandlestickPattern::MorningStar => PatternCategory::Bullish,
            CandlestickPattern::ShootingStar
            | CandlestickPattern::BearishEngulfing
            | CandlestickPattern::EveningStar => PatternCategory::Bearish,
        }
    }

    pub fn strength(&self) -> PatternStrength {
        match self {
            CandlestickPattern::Doji | CandlestickPattern::InvertedHammer => {
                PatternStrength::Medium
            }
            CandlestickPattern::Hammer | CandlestickPattern::ShootingStar => {
                PatternStrength::Strong
            }
            CandlestickPattern::BullishEngulfing
            | CandlestickPattern::BearishEngulfing
            | CandlestickPattern::MorningStar
            | CandlestickPattern::EveningStar => PatternStrength::VeryStrong,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternHit {
    pub pattern: CandlestickPattern,
    pub category: PatternCategory,
    pub strength: PatternStrength,
}

impl From<CandlestickPattern> for PatternHit {
    fn from(pattern: CandlestickPattern) -> Self {
        Self {
            pattern,
            category: pattern.category(),
            strength: pattern.strength(),
        }
    }
}

/// Patterns found on the most recent bars, with bull/bear tallies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandlestickReport {
    pub patterns: Vec<PatternHit>,
    pub bullish_count: usize,
    pub bearish_count: usize,
}

fn body(c: &Candle) -> f64 {
    (c.close - c.open).abs()
}

fn lower_shadow(c: &Candle) -> f64 {
    c.open.min(c.close) - c.low
}

fn upper_shadow(c: &Candle) -> f64 {
    c.high - c.open.max(c.close)
}

fn is_bullish(c: &Candle) -> bool {
    c.close > c.open
}

fn is_bearish(c: &Candle) -> bool {
    c.close < c.open
}

/// Body under 10% of the range. A zero range is not a doji.
pub fn is_doji(c: &Candle) -> bool {
    let range = c.high - c.low;
    range > 0.0 && body(c) / range < 0.1
}

/// Long lower shadow, little upper shadow. Requires a non-zero body.
pub fn is_hammer(c: &Candle) -> bool {
    let b = body(c);
    b > 0.0 && lower_shadow(c) > b * 2.0 && upper_shadow(c) < b * 0.3
}

pub fn is_inverted_hammer(c: &Candle) -> bool {
    let b = body(c);
    b > 0.0 && upper_shadow(c) > b * 2.0 && lower_shadow(c) < b * 0.3
}

/// Inverted-hammer geometry with a bearish close
pub fn is_shooting_star(c: &Candle) -> bool {
    is_inverted_hammer(c) && c.close < c.open
}

/// Bearish bar fully engulfed by a bullish bar
pub fn is_bullish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    is_bearish(prev) && is_bullish(curr) && curr.open < prev.close && curr.close > prev.open
}

pub fn is_bearish_engulfing(prev: &Candle, curr: &Candle) -> bool {
    is_bullish(prev) && is_bearish(curr) && curr.open > prev.close && curr.close < prev.open
}

/// Bearish bar, small star, bullish bar closing above the first bar's midpoint
pub fn is_morning_star(first: &Candle, star: &Candle, third: &Candle) -> bool {
    if !is_bearish(first) || !is_bullish(third) {
        return false;
    }
    if body(star) > body(first) * 0.3 {
        return false;
    }
    third.close > (first.open + first.close) / 2.0
}

pub fn is_evening_star(first: &Candle, star: &Candle, third: &Candle) -> bool {
    if !is_bullish(first) || !is_bearish(third) {
        return false;
    }
    if body(star) > body(first) * 0.3 {
        return false;
    }
    third.close < (first.open + first.close) / 2.0
}

/// Detect all candlestick patterns on the most recent bar (single-candle)
/// and the last two/three bars (multi-candle).
pub fn detect_all(candles: &[Candle]) -> CandlestickReport {
    if candles.len() < 3 {
        return CandlestickReport::default();
    }

    let mut patterns: Vec<PatternHit> = Vec::new();
    let curr = &candles[candles.len() - 1];
    let prev = &candles[candles.len() - 2];
    let first = &candles[candles.len() - 3];

    if is_doji(curr) {
        patterns.push(CandlestickPattern::Doji.into());
    }
    if is_hammer(curr) {
        patterns.push(CandlestickPattern::Hammer.into());
    }
    if is_inverted_hammer(curr) {
        patterns.push(CandlestickPattern::InvertedHammer.into());
    }
    if is_shooting_star(curr) {
        patterns.push(CandlestickPattern::ShootingStar.into());
    }

    if is_bullish_engulfing(prev, curr) {
        patterns.push(CandlestickPattern::BullishEngulfing.into());
    }
    if is_bearish_engulfing(prev, curr) {
        patterns.push(CandlestickPattern::BearishEngulfing.into());
    }
    if is_morning_star(first, prev, curr) {
        patterns.push(CandlestickPattern::MorningStar.into());
    }
    if is_evening_star(first, prev, curr) {
        patterns.push(CandlestickPattern::EveningStar.into());
    }

    let bullish_count = patterns
        .iter()
        .filter(|p| p.category == PatternCategory::Bullish)
        .count();
    let bearish_count = patterns
        .iter()
        .filter(|p| p.category == PatternCategory::Bearish)
        .count();

    CandlestickReport {
        patterns,
        bullish_count,
        bearish_count,
    }
}
