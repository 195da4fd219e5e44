use super::{all_season, fallback, kharif, rabi, zaid, Rule};
use crate::models::{Crop, EnvironmentSample, Recommendation, Season};
use serde::Serialize;

/// Where in the evaluation order a decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionStage {
    /// A row of the sample's season table matched
    Season(Season),
    /// The season table was exhausted and a fallback override matched
    Override,
    /// Nothing matched; the generic default stands
    Default,
}

/// A recommendation together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub recommendation: Recommendation,
    pub rule_id: Option<&'static str>,
    pub stage: DecisionStage,
}

/// Deterministic crop classifier.
///
/// Dispatches on season, walks that season's table top to bottom and stops at
/// the first match. Tables of different seasons are never mixed. If the
/// season table yields nothing, the fallback overrides are tried in order and
/// the generic default is used when none of them match either. Every sample
/// resolves to exactly one crop.
pub struct DecisionEngine {
    kharif: &'static [Rule],
    rabi: &'static [Rule],
    zaid: &'static [Rule],
    all_season: &'static [Rule],
    overrides: &'static [Rule],
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self {
            kharif: kharif::RULES,
            rabi: rabi::RULES,
            zaid: zaid::RULES,
            all_season: all_season::RULES,
            overrides: fallback::OVERRIDES,
        }
    }

    pub fn rules_for(&self, season: Season) -> &'static [Rule] {
        match season {
            Season::Kharif => self.kharif,
            Season::Rabi => self.rabi,
            Season::Zaid => self.zaid,
            Season::All => self.all_season,
        }
    }

    pub fn classify(&self, sample: &EnvironmentSample) -> Recommendation {
        self.decide(sample).recommendation
    }

    pub fn decide(&self, sample: &EnvironmentSample) -> Decision {
        let season_rules = self.rules_for(sample.season);

        let decision = if let Some((rule, crop)) = first_match(season_rules, sample) {
            Decision {
                recommendation: crop.into(),
                rule_id: Some(rule.id),
                stage: DecisionStage::Season(sample.season),
            }
        } else if let Some((rule, crop)) = first_match(self.overrides, sample) {
            Decision {
                recommendation: crop.into(),
                rule_id: Some(rule.id),
                stage: DecisionStage::Override,
            }
        } else {
            Decision {
                recommendation: fallback::DEFAULT_CROP.into(),
                rule_id: None,
                stage: DecisionStage::Default,
            }
        };

        tracing::debug!(
            soil = %sample.soil_type,
            season = %sample.season,
            temperature_c = sample.temperature_c,
            rainfall_mm = sample.rainfall_mm,
            rule = decision.rule_id.unwrap_or("default"),
            crop = %decision.recommendation.crop_name,
            "Classified environment sample"
        );

        decision
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        Season::ALL
            .iter()
            .flat_map(|s| self.rules_for(*s).iter())
            .chain(self.overrides.iter())
            .map(|r| (r.id, r.name))
            .collect()
    }

    /// Every crop any rule, override or the default can produce.
    pub fn catalog(&self) -> Vec<Crop> {
        let produced = Season::ALL
            .iter()
            .flat_map(|s| self.rules_for(*s).iter())
            .chain(self.overrides.iter())
            .map(|r| r.crop)
            .chain(std::iter::once(fallback::DEFAULT_CROP));

        let mut crops = Vec::new();
        for crop in produced {
            if !crops.contains(&crop) {
                crops.push(crop);
            }
        }
        crops
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match<'a>(rules: &'a [Rule], sample: &EnvironmentSample) -> Option<(&'a Rule, Crop)> {
    rules
        .iter()
        .find_map(|rule| rule.evaluate(sample).map(|crop| (rule, crop)))
}
