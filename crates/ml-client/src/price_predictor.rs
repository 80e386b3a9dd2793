use std::time::Duration;

use engine_core::{Candle, PredictionResult};
use serde::Serialize;

use crate::error::{MLError, MLResult};

#[derive(Debug, Clone, Serialize)]
struct PredictionRequest<'a> {
    symbol: &'a str,
    candles: &'a [Candle],
}

/// HTTP client for the external price-predictor service
#[derive(Clone)]
pub struct PricePredictorClient {
    client: reqwest::Client,
    base_url: String,
}

impl PricePredictorClient {
    pub fn new(base_url: String, timeout: Duration) -> MLResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Predict direction and percent change for the given window
    pub async fn predict(&self, symbol: &str, candles: &[Candle]) -> MLResult<PredictionResult> {
        let request = PredictionRequest { symbol, candles };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                return Err(MLError::ModelNotLoaded);
            }
            return Err(MLError::ServiceUnavailable(format!("Status: {status}")));
        }

        let result = response.json::<PredictionResult>().await?;

        if !(0.0..=1.0).contains(&result.confidence) {
            return Err(MLError::InvalidResponse(format!(
                "confidence {} outside [0, 1]",
                result.confidence
            )));
        }

        Ok(result)
    }

    /// Check service health
    pub async fn health(&self) -> MLResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
