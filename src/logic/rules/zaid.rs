use super::{soil_in, Rule};
use crate::models::{Crop, EnvironmentSample, SoilType};

/// Summer crops, only for hot (>25°C) and dry (<50mm) conditions.
pub const RULES: &[Rule] = &[
    Rule {
        id: "zaid_melons",
        name: "Zaid Melons",
        when: |s| hot_and_dry(s) && soil_in(s, &[SoilType::Sandy, SoilType::Loamy]),
        crop: Crop::WatermelonMuskmelon,
    },
    Rule {
        id: "zaid_gourds",
        name: "Zaid Gourds",
        when: hot_and_dry,
        crop: Crop::CucumberBitterGourd,
    },
];

fn hot_and_dry(s: &EnvironmentSample) -> bool {
    s.temperature_c > 25.0 && s.rainfall_mm < 50.0
}
