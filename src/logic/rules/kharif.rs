use super::{soil_in, Rule};
use crate::models::{Crop, EnvironmentSample, SoilType};

/// Monsoon crops.
///
/// Heavy rain (>100mm) on a warm plot (>=25°C) picks a crop by soil; moderate
/// rain (50-100mm) picks millets whatever the soil or temperature.
pub const RULES: &[Rule] = &[
    Rule {
        id: "kharif_rice",
        name: "Kharif Paddy",
        when: |s| wet_and_warm(s) && soil_in(s, &[SoilType::Clay, SoilType::Loamy]),
        crop: Crop::Rice,
    },
    Rule {
        id: "kharif_cotton",
        name: "Kharif Cotton",
        when: |s| wet_and_warm(s) && s.soil_type == SoilType::Black,
        crop: Crop::Cotton,
    },
    Rule {
        id: "kharif_maize",
        name: "Kharif Maize",
        when: wet_and_warm,
        crop: Crop::Maize,
    },
    Rule {
        id: "kharif_millets",
        name: "Kharif Millets",
        when: |s| (50.0..=100.0).contains(&s.rainfall_mm),
        crop: Crop::JowarMillets,
    },
];

fn wet_and_warm(s: &EnvironmentSample) -> bool {
    s.rainfall_mm > 100.0 && s.temperature_c >= 25.0
}
