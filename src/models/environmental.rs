use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Sandy,
    Clay,
    /// Used whenever the soil classifier cannot give an answer
    #[default]
    Loamy,
    Black,
    Red,
}

impl SoilType {
    pub const ALL: [SoilType; 5] = [
        SoilType::Sandy,
        SoilType::Clay,
        SoilType::Loamy,
        SoilType::Black,
        SoilType::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Sandy => "Sandy",
            SoilType::Clay => "Clay",
            SoilType::Loamy => "Loamy",
            SoilType::Black => "Black",
            SoilType::Red => "Red",
        }
    }

    /// Case-insensitive parse of a soil label.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandy" => Some(SoilType::Sandy),
            "clay" => Some(SoilType::Clay),
            "loamy" => Some(SoilType::Loamy),
            "black" => Some(SoilType::Black),
            "red" => Some(SoilType::Red),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agricultural season on the Indian cropping calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    /// Monsoon, June to October
    Kharif,
    /// Winter, November to March
    Rabi,
    /// Summer, April and May
    Zaid,
    /// Not tied to a cropping window
    All,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Kharif, Season::Rabi, Season::Zaid, Season::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Kharif => "Kharif",
            Season::Rabi => "Rabi",
            Season::Zaid => "Zaid",
            Season::All => "All",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kharif" => Some(Season::Kharif),
            "rabi" => Some(Season::Rabi),
            "zaid" => Some(Season::Zaid),
            "all" => Some(Season::All),
            _ => None,
        }
    }

    /// Like `from_str`, but any label outside the calendar lands in the
    /// general-conditions bucket instead of being rejected.
    pub fn from_label(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            tracing::warn!(season = %s, "Unrecognized season label, treating as All");
            Season::All
        })
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical input to the decision engine. Built once per request and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSample {
    pub soil_type: SoilType,
    pub temperature_c: f64,
    pub rainfall_mm: f64,
    pub season: Season,
}

impl EnvironmentSample {
    pub fn new(soil_type: SoilType, temperature_c: f64, rainfall_mm: f64, season: Season) -> Self {
        Self {
            soil_type,
            temperature_c,
            rainfall_mm,
            season,
        }
    }
}

/// Current conditions reported by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// `None` when the provider reported no precipitation block at all.
    pub rainfall_mm: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilSource {
    Classifier,
    Fallback,
}

impl SoilSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilSource::Classifier => "Soil Classifier",
            SoilSource::Fallback => "Default",
        }
    }
}

impl std::fmt::Display for SoilSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainfallSource {
    Observed,
    Synthesized,
}

impl RainfallSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RainfallSource::Observed => "Observed",
            RainfallSource::Synthesized => "Synthesized",
        }
    }
}

impl std::fmt::Display for RainfallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An environment sample derived from live telemetry, plus the signals that
/// were carried along but are not consumed by the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedEnvironment {
    pub sample: EnvironmentSample,
    pub humidity_pct: f64,
    pub location: Option<String>,
    pub soil_source: SoilSource,
    pub rainfall_source: RainfallSource,
}

/// Round to one decimal place, judged on the exact decimal value of the
/// float: 24.95 is stored as 24.9499... and rounds down.
///
/// Exact halves (x.25, x.75) round away from zero.
pub fn round1(value: f64) -> f64 {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (value * 10.0).round() / 10.0;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}
