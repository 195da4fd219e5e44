pub mod rules;
pub mod season;
pub mod service;
pub mod telemetry;

pub use rules::{Decision, DecisionEngine, DecisionStage};
pub use season::{Clock, FixedClock, SeasonResolver, SystemClock};
pub use service::{
    require_coordinates, EnvironmentInput, RecommendationOutcome, RecommendationRequest,
    RecommendationService,
};
pub use telemetry::{RainfallSynthesizer, RandomRainfall, TelemetryMerger};
