use super::Rule;
use crate::models::{Crop, SoilType};

/// Crop used when neither the season table nor an override matched.
pub const DEFAULT_CROP: Crop = Crop::MixedCropping;

/// Overrides for the generic default. Only consulted after the season table
/// came up empty.
pub const OVERRIDES: &[Rule] = &[
    Rule {
        id: "fallback_bajra",
        name: "Drought Fallback",
        when: |s| s.rainfall_mm < 40.0,
        crop: Crop::PearlMillet,
    },
    Rule {
        id: "fallback_groundnut",
        name: "Sandy Soil Fallback",
        when: |s| s.soil_type == SoilType::Sandy,
        crop: Crop::Groundnut,
    },
];
