use super::{SoilClassifier, SoilFeatures};
use crate::config::SoilClassifierConfig;
use crate::error::{CropwiseError, Result};
use crate::models::SoilType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for a model endpoint that predicts soil type from location and
/// weather features.
///
/// Request body: `{"instances": [{"features": [lat, lon, temp, humidity, rain]}]}`
/// Response body: `{"predictions": [{"predicted_label": "Black"}]}`
pub struct HttpSoilClassifier {
    client: reqwest::Client,
    config: SoilClassifierConfig,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    features: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    predicted_label: Option<String>,
}

impl HttpSoilClassifier {
    pub fn new(config: SoilClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl SoilClassifier for HttpSoilClassifier {
    fn source_id(&self) -> &'static str {
        "SoilClassifier"
    }

    async fn predict(&self, features: &SoilFeatures) -> Result<SoilType> {
        let payload = build_request(features);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| CropwiseError::UpstreamUnavailable(format!("Soil classifier: {}", e)))?;

        if !response.status().is_success() {
            return Err(CropwiseError::UpstreamUnavailable(format!(
                "Soil classifier returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CropwiseError::UpstreamUnavailable(format!("Soil classifier: {}", e)))?;

        parse_prediction(&body)
    }
}

fn build_request(features: &SoilFeatures) -> PredictRequest {
    PredictRequest {
        instances: vec![PredictInstance {
            features: features.to_vec(),
        }],
    }
}

fn parse_prediction(body: &str) -> Result<SoilType> {
    let response: PredictResponse = serde_json::from_str(body)?;

    let label = response
        .predictions
        .into_iter()
        .next()
        .and_then(|p| p.predicted_label)
        .ok_or_else(|| {
            CropwiseError::InvalidData("Soil classifier returned no prediction".into())
        })?;

    SoilType::from_str(&label).ok_or_else(|| {
        CropwiseError::InvalidData(format!("Soil classifier returned unknown label '{}'", label))
    })
}
