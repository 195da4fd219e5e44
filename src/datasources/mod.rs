pub mod openweathermap;
pub mod soil_classifier;

pub use openweathermap::OpenWeatherMapClient;
pub use soil_classifier::HttpSoilClassifier;

use crate::error::Result;
use crate::models::{SoilType, WeatherObservation};
use async_trait::async_trait;
use serde::Serialize;

/// Current-conditions lookup keyed by coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Provider identifier, used in logs
    fn source_id(&self) -> &'static str;

    /// Fails with `UpstreamUnavailable` when the provider cannot answer.
    async fn observe(&self, latitude: f64, longitude: f64) -> Result<WeatherObservation>;
}

/// Opaque soil-type predictor. Callers must treat any error as "no answer".
#[async_trait]
pub trait SoilClassifier: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn predict(&self, features: &SoilFeatures) -> Result<SoilType>;
}

/// Inputs to the soil classifier, in the order the model expects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoilFeatures {
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
}

impl SoilFeatures {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.latitude,
            self.longitude,
            self.temperature_c,
            self.humidity_pct,
            self.rainfall_mm,
        ]
    }
}
