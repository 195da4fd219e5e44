use super::{soil_in, Rule};
use crate::models::{Crop, SoilType};

/// General conditions, for samples not tied to a cropping window.
pub const RULES: &[Rule] = &[Rule {
    id: "all_vegetables",
    name: "All-Season Vegetables",
    when: |s| {
        soil_in(s, &[SoilType::Loamy, SoilType::Red]) && (20.0..=30.0).contains(&s.temperature_c)
    },
    crop: Crop::TomatoesPotatoes,
}];
