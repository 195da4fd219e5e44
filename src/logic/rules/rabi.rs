use super::{soil_in, Rule};
use crate::models::{Crop, EnvironmentSample, SoilType};

/// Winter crops. Nothing here fires outside the 10-25°C band.
///
/// Loamy appears in both the wheat and the mustard row. Wheat is listed first,
/// so Loamy never reaches mustard; the ordering is load-bearing.
pub const RULES: &[Rule] = &[
    Rule {
        id: "rabi_wheat",
        name: "Rabi Wheat",
        when: |s| cool(s) && soil_in(s, &[SoilType::Loamy, SoilType::Clay]),
        crop: Crop::Wheat,
    },
    Rule {
        id: "rabi_mustard",
        name: "Rabi Mustard",
        when: |s| cool(s) && soil_in(s, &[SoilType::Sandy, SoilType::Loamy]),
        crop: Crop::Mustard,
    },
    Rule {
        id: "rabi_chickpea",
        name: "Rabi Gram",
        when: cool,
        crop: Crop::Chickpea,
    },
];

fn cool(s: &EnvironmentSample) -> bool {
    (10.0..=25.0).contains(&s.temperature_c)
}
