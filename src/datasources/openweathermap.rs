use super::WeatherProvider;
use crate::config::OpenWeatherMapConfig;
use crate::error::{CropwiseError, Result};
use crate::models::WeatherObservation;
use async_trait::async_trait;
use serde::Deserialize;

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
}

// OpenWeatherMap current-weather response structures
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    main: OwmMain,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmErrorBody {
    message: String,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch current conditions at the given coordinates, in metric units.
    pub async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<WeatherObservation> {
        let url = format!(
            "{}/weather?lat={}&lon={}&units=metric&appid={}",
            self.config.base_url.trim_end_matches('/'),
            latitude,
            longitude,
            self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CropwiseError::UpstreamUnavailable(format!("OpenWeatherMap: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OwmErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(CropwiseError::UpstreamUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, message
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CropwiseError::UpstreamUnavailable(format!("OpenWeatherMap: {}", e)))?;

        parse_current(&body)
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self, latitude: f64, longitude: f64) -> Result<bool> {
        match self.fetch_current(latitude, longitude).await {
            Ok(_) => Ok(true),
            Err(CropwiseError::UpstreamUnavailable(msg)) => {
                tracing::debug!("OpenWeatherMap check failed: {}", msg);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    fn source_id(&self) -> &'static str {
        "OpenWeatherMap"
    }

    async fn observe(&self, latitude: f64, longitude: f64) -> Result<WeatherObservation> {
        self.fetch_current(latitude, longitude).await
    }
}

fn parse_current(body: &str) -> Result<WeatherObservation> {
    let owm: OwmCurrentResponse = serde_json::from_str(body).map_err(|e| {
        CropwiseError::UpstreamUnavailable(format!(
            "Failed to parse OpenWeatherMap response: {}",
            e
        ))
    })?;

    Ok(convert_response(owm))
}

fn convert_response(response: OwmCurrentResponse) -> WeatherObservation {
    // A rain block means precipitation was reported: prefer the last hour,
    // then the last three hours. Zero volumes count as "not this window".
    let rainfall_mm = response.rain.map(|rain| {
        [rain.one_hour, rain.three_hour]
            .into_iter()
            .flatten()
            .find(|v| *v != 0.0)
            .unwrap_or(0.0)
    });

    WeatherObservation {
        temperature_c: response.main.temp,
        humidity_pct: response.main.humidity,
        rainfall_mm,
        location: response.name.filter(|n| !n.is_empty()),
    }
}
