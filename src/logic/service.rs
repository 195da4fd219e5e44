use super::rules::DecisionEngine;
use super::telemetry::{validate_coordinates, TelemetryMerger};
use crate::error::{CropwiseError, Result};
use crate::models::{DetectedEnvironment, EnvironmentSample, Recommendation, Season, SoilType};
use serde::{Deserialize, Serialize};

/// Caller-supplied environment, before validation. Labels are free-form and
/// matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInput {
    pub soil_type: Option<String>,
    #[serde(alias = "temperature")]
    pub temperature_c: Option<f64>,
    #[serde(alias = "rainfall")]
    pub rainfall_mm: Option<f64>,
    pub season: Option<String>,
}

impl EnvironmentInput {
    pub fn new(soil_type: &str, temperature_c: f64, rainfall_mm: f64, season: &str) -> Self {
        Self {
            soil_type: Some(soil_type.to_string()),
            temperature_c: Some(temperature_c),
            rainfall_mm: Some(rainfall_mm),
            season: Some(season.to_string()),
        }
    }

    /// Canonicalize into an [`EnvironmentSample`].
    ///
    /// Absent or blank fields are `MissingField` (all of them are listed).
    /// An unknown soil label is `InvalidInput`; an unknown season label is
    /// accepted as [`Season::All`].
    pub fn into_sample(self) -> Result<EnvironmentSample> {
        let soil = self.soil_type.filter(|s| !s.trim().is_empty());
        let season = self.season.filter(|s| !s.trim().is_empty());

        let mut missing = Vec::new();
        if soil.is_none() {
            missing.push("soilType");
        }
        if self.temperature_c.is_none() {
            missing.push("temperature");
        }
        if self.rainfall_mm.is_none() {
            missing.push("rainfall");
        }
        if season.is_none() {
            missing.push("season");
        }

        match (soil, self.temperature_c, self.rainfall_mm, season) {
            (Some(soil), Some(temperature_c), Some(rainfall_mm), Some(season)) => {
                let soil_type = SoilType::from_str(&soil).ok_or_else(|| {
                    CropwiseError::InvalidInput(format!(
                        "unknown soil type '{}' (expected one of Sandy, Clay, Loamy, Black, Red)",
                        soil
                    ))
                })?;
                Ok(EnvironmentSample::new(
                    soil_type,
                    temperature_c,
                    rainfall_mm,
                    Season::from_label(&season),
                ))
            }
            _ => Err(CropwiseError::MissingField(missing.join(", "))),
        }
    }
}

/// Either an explicit environment or a location to auto-detect one for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum RecommendationRequest {
    Explicit(EnvironmentInput),
    AutoDetect {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
}

/// Both coordinates present, finite, and on the globe.
pub fn require_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(f64, f64)> {
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, Some(_)) => return Err(CropwiseError::MissingField("latitude".into())),
        (Some(_), None) => return Err(CropwiseError::MissingField("longitude".into())),
        (None, None) => return Err(CropwiseError::MissingField("latitude, longitude".into())),
    };
    validate_coordinates(latitude, longitude)?;
    Ok((latitude, longitude))
}

/// The recommendation plus the sample it was based on, so the caller can
/// persist or display the basis for the decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutcome {
    pub recommendation: Recommendation,
    pub sample: EnvironmentSample,
    pub rule_id: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<DetectedEnvironment>,
}

pub struct RecommendationService {
    engine: DecisionEngine,
    telemetry: Option<TelemetryMerger>,
}

impl RecommendationService {
    pub fn new(telemetry: TelemetryMerger) -> Self {
        Self {
            engine: DecisionEngine::new(),
            telemetry: Some(telemetry),
        }
    }

    /// A service that only accepts explicit environments.
    pub fn explicit_only() -> Self {
        Self {
            engine: DecisionEngine::new(),
            telemetry: None,
        }
    }

    pub fn classify(&self, sample: &EnvironmentSample) -> Recommendation {
        self.engine.classify(sample)
    }

    pub async fn detect_environment(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<DetectedEnvironment> {
        let telemetry = self.telemetry.as_ref().ok_or_else(|| {
            CropwiseError::UpstreamUnavailable(
                "environment auto-detection is not configured".into(),
            )
        })?;
        telemetry.detect(latitude, longitude).await
    }

    pub async fn recommend(&self, request: RecommendationRequest) -> Result<RecommendationOutcome> {
        let (sample, detected) = match request {
            RecommendationRequest::Explicit(input) => (input.into_sample()?, None),
            RecommendationRequest::AutoDetect {
                latitude,
                longitude,
            } => {
                let (latitude, longitude) = require_coordinates(latitude, longitude)?;
                let detected = self.detect_environment(latitude, longitude).await?;
                (detected.sample, Some(detected))
            }
        };

        let decision = self.engine.decide(&sample);

        tracing::info!(
            crop = %decision.recommendation.crop_name,
            rule = decision.rule_id.unwrap_or("default"),
            auto_detected = detected.is_some(),
            "Recommendation ready"
        );

        Ok(RecommendationOutcome {
            recommendation: decision.recommendation,
            sample,
            rule_id: decision.rule_id,
            detected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::telemetry::tests::{july, FixedRainfall, StubClassifier, StubWeather};
    use crate::models::{Crop, SoilSource};
    use std::sync::Arc;

    fn service() -> RecommendationService {
        let telemetry = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(28.5, 70.0, Some(110.0))),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Answers(SoilType::Black)));
        RecommendationService::new(telemetry)
    }

    #[tokio::test]
    async fn explicit_request_black_kharif_is_cotton() {
        let outcome = service()
            .recommend(RecommendationRequest::Explicit(EnvironmentInput::new(
                "Black", 27.0, 120.0, "Kharif",
            )))
            .await
            .unwrap();

        assert_eq!(outcome.recommendation.crop_name, "Cotton");
        assert!(outcome
            .recommendation
            .fertilizer_advice
            .starts_with("Apply DAP at sowing"));
        assert_eq!(
            outcome.sample,
            EnvironmentSample::new(SoilType::Black, 27.0, 120.0, Season::Kharif)
        );
        assert_eq!(outcome.rule_id, Some("kharif_cotton"));
        assert!(outcome.detected.is_none());
    }

    #[tokio::test]
    async fn labels_are_case_insensitive() {
        let svc = RecommendationService::explicit_only();
        let lower = svc
            .recommend(RecommendationRequest::Explicit(EnvironmentInput::new(
                "loamy", 26.0, 150.0, "KHARIF",
            )))
            .await
            .unwrap();
        let canonical = svc
            .recommend(RecommendationRequest::Explicit(EnvironmentInput::new(
                "Loamy", 26.0, 150.0, "Kharif",
            )))
            .await
            .unwrap();

        assert_eq!(lower.recommendation, canonical.recommendation);
        assert_eq!(lower.sample, canonical.sample);
        assert_eq!(lower.recommendation.crop, Crop::Rice);
    }

    #[tokio::test]
    async fn sandy_rabi_hot_dry_is_bajra() {
        let outcome = RecommendationService::explicit_only()
            .recommend(RecommendationRequest::Explicit(EnvironmentInput::new(
                "Sandy", 30.0, 10.0, "Rabi",
            )))
            .await
            .unwrap();
        assert_eq!(outcome.recommendation.crop_name, "Pearl Millet (Bajra)");
        assert_eq!(outcome.rule_id, Some("fallback_bajra"));
    }

    #[tokio::test]
    async fn missing_fields_are_all_reported() {
        let input = EnvironmentInput {
            soil_type: Some("  ".into()),
            temperature_c: Some(20.0),
            rainfall_mm: None,
            season: None,
        };
        let err = RecommendationService::explicit_only()
            .recommend(RecommendationRequest::Explicit(input))
            .await
            .unwrap_err();
        match err {
            CropwiseError::MissingField(fields) => {
                assert_eq!(fields, "soilType, rainfall, season")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn zero_temperature_and_rainfall_are_present() {
        let sample = EnvironmentInput::new("Clay", 0.0, 0.0, "Rabi")
            .into_sample()
            .unwrap();
        assert_eq!(sample.temperature_c, 0.0);
        assert_eq!(sample.rainfall_mm, 0.0);
    }

    #[test]
    fn unknown_soil_is_invalid_input() {
        let err = EnvironmentInput::new("Peat", 20.0, 60.0, "Rabi")
            .into_sample()
            .unwrap_err();
        assert!(matches!(err, CropwiseError::InvalidInput(_)));
    }

    #[test]
    fn unknown_season_goes_to_all_bucket() {
        let sample = EnvironmentInput::new("Red", 25.0, 60.0, "Monsoon")
            .into_sample()
            .unwrap();
        assert_eq!(sample.season, Season::All);
        assert_eq!(
            RecommendationService::explicit_only().classify(&sample).crop,
            Crop::TomatoesPotatoes
        );
    }

    #[test]
    fn request_json_accepts_short_field_names() {
        let json = r#"{"mode": "explicit", "soilType": "black", "temperature": 27,
                       "rainfall": 120, "season": "kharif"}"#;
        let request: RecommendationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            RecommendationRequest::Explicit(EnvironmentInput::new("black", 27.0, 120.0, "kharif"))
        );

        let json = r#"{"mode": "autoDetect", "latitude": 21.1}"#;
        let request: RecommendationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            RecommendationRequest::AutoDetect {
                latitude: Some(21.1),
                longitude: None
            }
        );
    }

    #[tokio::test]
    async fn auto_detect_runs_telemetry_then_engine() {
        let outcome = service()
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(21.15),
                longitude: Some(79.09),
            })
            .await
            .unwrap();

        // 28.5°C, 110mm, Black soil in July
        assert_eq!(outcome.recommendation.crop, Crop::Cotton);
        assert_eq!(outcome.sample.season, Season::Kharif);
        let detected = outcome.detected.unwrap();
        assert_eq!(detected.sample, outcome.sample);
        assert_eq!(detected.humidity_pct, 70.0);
    }

    #[tokio::test]
    async fn auto_detect_rounding_keeps_threshold_readings_below() {
        let telemetry = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(24.95, 85.0, Some(150.0))),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Answers(SoilType::Clay)));

        let outcome = RecommendationService::new(telemetry)
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(21.15),
                longitude: Some(79.09),
            })
            .await
            .unwrap();

        // 24.95 reads as 24.9, short of the 25°C paddy threshold
        assert_eq!(outcome.sample.temperature_c, 24.9);
        assert_eq!(outcome.recommendation.crop, Crop::MixedCropping);
    }

    #[tokio::test]
    async fn auto_detect_survives_classifier_outage() {
        let telemetry = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(26.0, 80.0, None)),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Fails))
        .with_rainfall_synthesizer(Arc::new(FixedRainfall(150.0)));

        let outcome = RecommendationService::new(telemetry)
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(21.15),
                longitude: Some(79.09),
            })
            .await
            .unwrap();

        let detected = outcome.detected.unwrap();
        assert_eq!(detected.soil_source, SoilSource::Fallback);
        assert_eq!(outcome.sample.soil_type, SoilType::Loamy);
        assert_eq!(outcome.recommendation.crop, Crop::Rice);
    }

    #[tokio::test]
    async fn auto_detect_missing_coordinates() {
        let svc = service();
        for (lat, lon, expected) in [
            (None, Some(79.0), "latitude"),
            (Some(21.0), None, "longitude"),
            (None, None, "latitude, longitude"),
        ] {
            let err = svc
                .recommend(RecommendationRequest::AutoDetect {
                    latitude: lat,
                    longitude: lon,
                })
                .await
                .unwrap_err();
            match err {
                CropwiseError::MissingField(field) => assert_eq!(field, expected),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn auto_detect_out_of_range_coordinates() {
        let err = service()
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(120.0),
                longitude: Some(79.0),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CropwiseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn auto_detect_weather_outage_is_upstream_error() {
        let telemetry = TelemetryMerger::new(Arc::new(StubWeather::failing()), july());
        let err = RecommendationService::new(telemetry)
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(21.15),
                longitude: Some(79.09),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CropwiseError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn explicit_only_service_rejects_auto_detect() {
        let err = RecommendationService::explicit_only()
            .recommend(RecommendationRequest::AutoDetect {
                latitude: Some(21.15),
                longitude: Some(79.09),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CropwiseError::UpstreamUnavailable(_)));
    }
}
