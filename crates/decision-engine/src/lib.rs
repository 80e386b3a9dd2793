pub mod autonomy;
pub mod engine;
pub mod fusion;


pub use autonomy::{resolve_action, TradeAction};
pub use engine::{CycleResult, TradingEngine};
pub use fusion::decide;
