use super::season::{Clock, SeasonResolver, SystemClock};
use crate::config::Config;
use crate::datasources::{
    HttpSoilClassifier, OpenWeatherMapClient, SoilClassifier, SoilFeatures, WeatherProvider,
};
use crate::error::{CropwiseError, Result};
use crate::models::{
    round1, DetectedEnvironment, EnvironmentSample, RainfallSource, SoilSource, SoilType,
    WeatherObservation,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Bounds of the rainfall substituted when the provider reports none, in mm.
pub const SYNTHETIC_RAINFALL_MIN: u32 = 50;
pub const SYNTHETIC_RAINFALL_MAX: u32 = 200;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces a rainfall figure when the weather provider reported no
/// precipitation at all.
pub trait RainfallSynthesizer: Send + Sync {
    fn synthesize(&self) -> f64;
}

/// Whole millimetres drawn uniformly from [50, 200).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRainfall;

impl RainfallSynthesizer for RandomRainfall {
    fn synthesize(&self) -> f64 {
        rand::thread_rng().gen_range(SYNTHETIC_RAINFALL_MIN..SYNTHETIC_RAINFALL_MAX) as f64
    }
}

/// Builds an [`EnvironmentSample`] from live signals: a weather observation
/// (mandatory), a soil classification (optional, falls back to the default
/// soil), and the season for today's date.
///
/// The classifier consumes weather-derived features, so the two calls run
/// one after the other.
pub struct TelemetryMerger {
    weather: Arc<dyn WeatherProvider>,
    soil_classifier: Option<Arc<dyn SoilClassifier>>,
    clock: Arc<dyn Clock>,
    rainfall: Arc<dyn RainfallSynthesizer>,
    weather_timeout: Duration,
    classifier_timeout: Duration,
}

impl TelemetryMerger {
    pub fn new(weather: Arc<dyn WeatherProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            weather,
            soil_classifier: None,
            clock,
            rainfall: Arc::new(RandomRainfall),
            weather_timeout: DEFAULT_TIMEOUT,
            classifier_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let weather = OpenWeatherMapClient::new(config.openweathermap.clone())?;
        let mut merger = Self::new(Arc::new(weather), Arc::new(SystemClock));
        merger.weather_timeout = config.openweathermap.timeout();

        match config.soil_classifier {
            Some(ref classifier_config) => {
                let classifier = HttpSoilClassifier::new(classifier_config.clone())?;
                tracing::info!(endpoint = %classifier.endpoint(), "Soil classifier configured");
                merger.classifier_timeout = classifier_config.timeout();
                merger.soil_classifier = Some(Arc::new(classifier));
            }
            None => {
                tracing::info!(
                    "Soil classifier not configured - detected soil will default to {}",
                    SoilType::default()
                );
            }
        }

        Ok(merger)
    }

    pub fn with_soil_classifier(mut self, classifier: Arc<dyn SoilClassifier>) -> Self {
        self.soil_classifier = Some(classifier);
        self
    }

    pub fn with_rainfall_synthesizer(mut self, rainfall: Arc<dyn RainfallSynthesizer>) -> Self {
        self.rainfall = rainfall;
        self
    }

    pub fn with_timeouts(mut self, weather: Duration, classifier: Duration) -> Self {
        self.weather_timeout = weather;
        self.classifier_timeout = classifier;
        self
    }

    pub fn has_soil_classifier(&self) -> bool {
        self.soil_classifier.is_some()
    }

    pub async fn detect(&self, latitude: f64, longitude: f64) -> Result<DetectedEnvironment> {
        validate_coordinates(latitude, longitude)?;

        let observation = self.observe_weather(latitude, longitude).await?;

        let (rainfall_mm, rainfall_source) = match observation.rainfall_mm {
            Some(mm) => (mm, RainfallSource::Observed),
            None => {
                let mm = self.rainfall.synthesize();
                tracing::warn!(
                    rainfall_mm = mm,
                    "No precipitation reported, using synthesized rainfall"
                );
                (mm, RainfallSource::Synthesized)
            }
        };

        let features = SoilFeatures {
            latitude,
            longitude,
            temperature_c: observation.temperature_c,
            humidity_pct: observation.humidity_pct,
            rainfall_mm,
        };
        let (soil_type, soil_source) = self.classify_soil(&features).await;

        let season = SeasonResolver::resolve_now(self.clock.as_ref());

        let sample = EnvironmentSample::new(
            soil_type,
            round1(observation.temperature_c),
            round1(rainfall_mm),
            season,
        );

        tracing::info!(
            latitude,
            longitude,
            location = observation.location.as_deref().unwrap_or("unknown"),
            soil = %sample.soil_type,
            soil_source = %soil_source,
            temperature_c = sample.temperature_c,
            rainfall_mm = sample.rainfall_mm,
            rainfall_source = %rainfall_source,
            season = %sample.season,
            "Detected environment"
        );

        Ok(DetectedEnvironment {
            sample,
            humidity_pct: observation.humidity_pct,
            location: observation.location,
            soil_source,
            rainfall_source,
        })
    }

    async fn observe_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherObservation> {
        let source = self.weather.source_id();

        match tokio::time::timeout(self.weather_timeout, self.weather.observe(latitude, longitude))
            .await
        {
            Ok(Ok(observation)) => Ok(observation),
            Ok(Err(CropwiseError::UpstreamUnavailable(msg))) => {
                Err(CropwiseError::UpstreamUnavailable(msg))
            }
            Ok(Err(e)) => Err(CropwiseError::UpstreamUnavailable(format!("{}: {}", source, e))),
            Err(_) => Err(CropwiseError::UpstreamUnavailable(format!(
                "{} timed out after {:?}",
                source, self.weather_timeout
            ))),
        }
    }

    /// Never fails: any classifier problem is logged and replaced by the
    /// default soil type.
    async fn classify_soil(&self, features: &SoilFeatures) -> (SoilType, SoilSource) {
        let Some(ref classifier) = self.soil_classifier else {
            return (SoilType::default(), SoilSource::Fallback);
        };

        match self.try_classify(classifier.as_ref(), features).await {
            Ok(soil) => (soil, SoilSource::Classifier),
            Err(e) => {
                tracing::warn!(
                    source = classifier.source_id(),
                    error = %e,
                    "Soil classification failed, using fallback {}",
                    SoilType::default()
                );
                (SoilType::default(), SoilSource::Fallback)
            }
        }
    }

    async fn try_classify(
        &self,
        classifier: &dyn SoilClassifier,
        features: &SoilFeatures,
    ) -> Result<SoilType> {
        tokio::time::timeout(self.classifier_timeout, classifier.predict(features))
            .await
            .map_err(|_| {
                CropwiseError::UpstreamUnavailable(format!(
                    "{} timed out after {:?}",
                    classifier.source_id(),
                    self.classifier_timeout
                ))
            })?
    }
}

/// Coordinates must be finite and on the globe.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CropwiseError::InvalidInput(format!(
            "latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CropwiseError::InvalidInput(format!(
            "longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logic::season::FixedClock;
    use crate::models::Season;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) struct StubWeather {
        pub observation: Option<WeatherObservation>,
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl StubWeather {
        pub(crate) fn reporting(temp: f64, humidity: f64, rain: Option<f64>) -> Self {
            Self {
                observation: Some(WeatherObservation {
                    temperature_c: temp,
                    humidity_pct: humidity,
                    rainfall_mm: rain,
                    location: Some("Nagpur".into()),
                }),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                observation: None,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for StubWeather {
        fn source_id(&self) -> &'static str {
            "StubWeather"
        }

        async fn observe(&self, _latitude: f64, _longitude: f64) -> Result<WeatherObservation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.observation
                .clone()
                .ok_or_else(|| CropwiseError::UpstreamUnavailable("stub weather down".into()))
        }
    }

    pub(crate) enum StubClassifier {
        Answers(SoilType),
        Fails,
        Hangs,
    }

    #[async_trait]
    impl SoilClassifier for StubClassifier {
        fn source_id(&self) -> &'static str {
            "StubClassifier"
        }

        async fn predict(&self, _features: &SoilFeatures) -> Result<SoilType> {
            match self {
                StubClassifier::Answers(soil) => Ok(*soil),
                StubClassifier::Fails => {
                    Err(CropwiseError::InvalidData("no prediction".into()))
                }
                StubClassifier::Hangs => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(SoilType::Clay)
                }
            }
        }
    }

    struct RecordingClassifier {
        seen: Mutex<Option<SoilFeatures>>,
    }

    #[async_trait]
    impl SoilClassifier for RecordingClassifier {
        fn source_id(&self) -> &'static str {
            "RecordingClassifier"
        }

        async fn predict(&self, features: &SoilFeatures) -> Result<SoilType> {
            *self.seen.lock().unwrap() = Some(*features);
            Ok(SoilType::Red)
        }
    }

    pub(crate) struct FixedRainfall(pub f64);

    impl RainfallSynthesizer for FixedRainfall {
        fn synthesize(&self) -> f64 {
            self.0
        }
    }

    pub(crate) fn july() -> Arc<dyn Clock> {
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()))
    }

    #[tokio::test]
    async fn merges_weather_soil_and_season() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(28.46, 72.0, Some(112.04))),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Answers(SoilType::Black)));

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(
            detected.sample,
            EnvironmentSample::new(SoilType::Black, 28.5, 112.0, Season::Kharif)
        );
        assert_eq!(detected.humidity_pct, 72.0);
        assert_eq!(detected.location.as_deref(), Some("Nagpur"));
        assert_eq!(detected.soil_source, SoilSource::Classifier);
        assert_eq!(detected.rainfall_source, RainfallSource::Observed);
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_loamy() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(30.0, 60.0, Some(20.0))),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Fails));

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(detected.sample.soil_type, SoilType::Loamy);
        assert_eq!(detected.soil_source, SoilSource::Fallback);
    }

    #[tokio::test]
    async fn classifier_timeout_falls_back_to_loamy() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(30.0, 60.0, Some(20.0))),
            july(),
        )
        .with_soil_classifier(Arc::new(StubClassifier::Hangs))
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(20));

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(detected.sample.soil_type, SoilType::Loamy);
        assert_eq!(detected.soil_source, SoilSource::Fallback);
    }

    #[tokio::test]
    async fn no_classifier_uses_default_soil() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(30.0, 60.0, Some(20.0))),
            july(),
        );
        assert!(!merger.has_soil_classifier());

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(detected.sample.soil_type, SoilType::Loamy);
        assert_eq!(detected.soil_source, SoilSource::Fallback);
    }

    #[tokio::test]
    async fn missing_rain_is_synthesized_not_zero_filled() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(30.0, 60.0, None)),
            july(),
        )
        .with_rainfall_synthesizer(Arc::new(FixedRainfall(137.0)));

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(detected.sample.rainfall_mm, 137.0);
        assert_eq!(detected.rainfall_source, RainfallSource::Synthesized);
    }

    #[tokio::test]
    async fn reported_zero_rain_is_kept() {
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(30.0, 60.0, Some(0.0))),
            july(),
        )
        .with_rainfall_synthesizer(Arc::new(FixedRainfall(137.0)));

        let detected = merger.detect(21.15, 79.09).await.unwrap();
        assert_eq!(detected.sample.rainfall_mm, 0.0);
        assert_eq!(detected.rainfall_source, RainfallSource::Observed);
    }

    #[tokio::test]
    async fn classifier_sees_weather_features() {
        let classifier = Arc::new(RecordingClassifier {
            seen: Mutex::new(None),
        });
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(27.3, 81.0, None)),
            july(),
        )
        .with_soil_classifier(classifier.clone())
        .with_rainfall_synthesizer(Arc::new(FixedRainfall(64.0)));

        merger.detect(12.97, 77.59).await.unwrap();

        let seen = classifier.seen.lock().unwrap().unwrap();
        assert_eq!(seen.to_vec(), vec![12.97, 77.59, 27.3, 81.0, 64.0]);
    }

    #[tokio::test]
    async fn weather_failure_is_upstream_unavailable() {
        let merger = TelemetryMerger::new(Arc::new(StubWeather::failing()), july())
            .with_soil_classifier(Arc::new(StubClassifier::Answers(SoilType::Clay)));

        let err = merger.detect(21.15, 79.09).await.unwrap_err();
        assert!(matches!(err, CropwiseError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn weather_timeout_is_upstream_unavailable() {
        let mut weather = StubWeather::reporting(30.0, 60.0, Some(10.0));
        weather.delay = Some(Duration::from_secs(30));
        let merger = TelemetryMerger::new(Arc::new(weather), july())
            .with_timeouts(Duration::from_millis(20), Duration::from_secs(5));

        let err = merger.detect(21.15, 79.09).await.unwrap_err();
        match err {
            CropwiseError::UpstreamUnavailable(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_coordinates_skip_the_network() {
        let weather = Arc::new(StubWeather::reporting(30.0, 60.0, Some(10.0)));
        let merger = TelemetryMerger::new(weather.clone(), july());

        for (lat, lon) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 10.0), (10.0, f64::INFINITY)] {
            let err = merger.detect(lat, lon).await.unwrap_err();
            assert!(matches!(err, CropwiseError::InvalidInput(_)));
        }
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn season_follows_injected_clock() {
        let december: Arc<dyn Clock> =
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()));
        let merger = TelemetryMerger::new(
            Arc::new(StubWeather::reporting(18.0, 40.0, Some(1.0))),
            december,
        );

        let detected = merger.detect(28.61, 77.2).await.unwrap();
        assert_eq!(detected.sample.season, Season::Rabi);
    }

    #[test]
    fn zero_coordinates_are_valid() {
        assert!(validate_coordinates(0.0, 0.0).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
    }

    #[test]
    fn random_rainfall_stays_in_range() {
        let synth = RandomRainfall;
        for _ in 0..1000 {
            let mm = synth.synthesize();
            assert!((50.0..200.0).contains(&mm), "{}", mm);
            assert_eq!(mm.fract(), 0.0);
        }
    }
}
