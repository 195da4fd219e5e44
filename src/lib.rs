pub mod config;
pub mod datasources;
pub mod db;
pub mod error;
pub mod logic;
pub mod models;

pub use config::Config;
pub use db::Database;
pub use error::{CropwiseError, Result};
pub use logic::{
    DecisionEngine, EnvironmentInput, RecommendationOutcome, RecommendationRequest,
    RecommendationService, TelemetryMerger,
};
pub use models::{
    Crop, DetectedEnvironment, EnvironmentSample, Recommendation, RecommendationRecord, Season,
    SoilType,
};
