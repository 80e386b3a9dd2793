use async_trait::async_trait;
use engine_core::{AnalysisError, Candle, PredictionProvider, PredictionResult};

use crate::error::MLError;
use crate::price_predictor::PricePredictorClient;

/// Bridges the HTTP predictor into the engine's collaborator trait.
/// Transport and protocol failures surface as `PredictionError`; the
/// decision engine decides whether to degrade to a neutral prediction.
#[async_trait]
impl PredictionProvider for PricePredictorClient {
    async fn predict(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<PredictionResult, AnalysisError> {
        PricePredictorClient::predict(self, symbol, candles)
            .await
            .map_err(|e| match e {
                MLError::ModelNotLoaded => {
                    AnalysisError::PredictionError("predictor model not loaded".to_string())
                }
                other => AnalysisError::PredictionError(other.to_string()),
            })
    }
}
