pub mod indicators;
pub mod signals;


pub use indicators::*;
pub use signals::*;
