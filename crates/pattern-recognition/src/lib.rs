pub mod candlestick;
pub mod chart;

pub use candlestick::*;
pub use chart::*;
