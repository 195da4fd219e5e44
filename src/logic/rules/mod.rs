pub mod all_season;
pub mod engine;
pub mod fallback;
pub mod kharif;
pub mod rabi;
pub mod zaid;

pub use engine::{Decision, DecisionEngine, DecisionStage};

use crate::models::{Crop, EnvironmentSample, SoilType};

/// One row of a rule table: a predicate over the sample and the crop it
/// yields when the predicate holds.
///
/// Tables are evaluated top to bottom and the first row that matches wins,
/// so a row may rely on earlier rows having failed.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Unique identifier for this rule
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub when: fn(&EnvironmentSample) -> bool,
    pub crop: Crop,
}

impl Rule {
    pub fn evaluate(&self, sample: &EnvironmentSample) -> Option<Crop> {
        (self.when)(sample).then_some(self.crop)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("crop", &self.crop)
            .finish()
    }
}

pub(crate) fn soil_in(sample: &EnvironmentSample, soils: &[SoilType]) -> bool {
    soils.contains(&sample.soil_type)
}
