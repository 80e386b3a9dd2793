pub mod audit;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use audit::TracingAuditSink;
pub use config::*;
pub use error::*;
pub use traits::*;
pub use types::*;
