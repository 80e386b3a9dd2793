pub mod manager;
pub mod models;
pub mod shutdown;

#[cfg(test)]
mod tests;

pub use manager::{account_handle, AccountHandle, RiskManager};
pub use models::*;
pub use shutdown::EmergencyShutdown;
