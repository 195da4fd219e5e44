use super::environmental::EnvironmentSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed catalog of crops the rule table can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    MixedCropping,
    Rice,
    Cotton,
    Maize,
    JowarMillets,
    Wheat,
    Mustard,
    Chickpea,
    WatermelonMuskmelon,
    CucumberBitterGourd,
    TomatoesPotatoes,
    PearlMillet,
    Groundnut,
}

impl Crop {
    pub const ALL: [Crop; 13] = [
        Crop::MixedCropping,
        Crop::Rice,
        Crop::Cotton,
        Crop::Maize,
        Crop::JowarMillets,
        Crop::Wheat,
        Crop::Mustard,
        Crop::Chickpea,
        Crop::WatermelonMuskmelon,
        Crop::CucumberBitterGourd,
        Crop::TomatoesPotatoes,
        Crop::PearlMillet,
        Crop::Groundnut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::MixedCropping => "Mixed Cropping",
            Crop::Rice => "Rice",
            Crop::Cotton => "Cotton",
            Crop::Maize => "Maize",
            Crop::JowarMillets => "Jowar / Millets",
            Crop::Wheat => "Wheat",
            Crop::Mustard => "Mustard",
            Crop::Chickpea => "Chickpea (Gram)",
            Crop::WatermelonMuskmelon => "Watermelon / Muskmelon",
            Crop::CucumberBitterGourd => "Cucumber / Bitter Gourd",
            Crop::TomatoesPotatoes => "Tomatoes / Potatoes",
            Crop::PearlMillet => "Pearl Millet (Bajra)",
            Crop::Groundnut => "Groundnut",
        }
    }

    /// Fertilizer guidance bound to this crop's rule.
    pub fn fertilizer_advice(&self) -> &'static str {
        match self {
            Crop::MixedCropping => "Use standard NPK fertilizers and organic compost.",
            Crop::Rice => {
                "Requires high Nitrogen. Apply Urea in split doses. Ensure standing water."
            }
            Crop::Cotton => {
                "Apply DAP at sowing. Top dress with Nitrogen. Watch out for bollworms."
            }
            Crop::Maize => "Needs good drainage. Apply Zinc sulphate if soil is deficient.",
            Crop::JowarMillets => {
                "Drought-resistant. Minimal chemical fertilizers needed; prefer farmyard manure."
            }
            Crop::Wheat => concat!(
                "Apply basal dose of NPK. ",
                "Adequate irrigation during crown root initiation is crucial."
            ),
            Crop::Mustard => {
                "Sulphur application is essential for oil content. Use SSP instead of DAP."
            }
            Crop::Chickpea => {
                "Seed treatment with Rhizobium culture recommended. Avoid excess irrigation."
            }
            Crop::WatermelonMuskmelon => concat!(
                "Apply well-rotted FYM. ",
                "Water-soluble fertilizers through drip irrigation yield best results."
            ),
            Crop::CucumberBitterGourd => "Keep soil moist. Apply organic manure before sowing.",
            Crop::TomatoesPotatoes => {
                "Requires balanced NPK. For potatoes, avoid excessive Nitrogen late in the season."
            }
            Crop::PearlMillet => {
                "Highly drought tolerant. Needs very little chemical intervention."
            }
            Crop::Groundnut => "Apply Gypsum at pegging stage for better pod formation.",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Crop::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub crop: Crop,
    pub crop_name: String,
    pub fertilizer_advice: String,
}

impl From<Crop> for Recommendation {
    fn from(crop: Crop) -> Self {
        Self {
            crop,
            crop_name: crop.as_str().to_string(),
            fertilizer_advice: crop.fertilizer_advice().to_string(),
        }
    }
}

/// What a caller persists after a recommendation: the basis, the result,
/// who asked, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    pub id: Option<i64>,
    pub user: String,
    pub sample: EnvironmentSample,
    pub recommendation: Recommendation,
    pub created_at: DateTime<Utc>,
}

impl RecommendationRecord {
    pub fn new(
        user: impl Into<String>,
        sample: EnvironmentSample,
        recommendation: Recommendation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user: user.into(),
            sample,
            recommendation,
            created_at,
        }
    }
}
