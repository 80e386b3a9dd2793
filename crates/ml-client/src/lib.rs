pub mod error;
pub mod price_predictor;
pub mod provider;

pub use error::{MLError, MLResult};
pub use price_predictor::PricePredictorClient;
