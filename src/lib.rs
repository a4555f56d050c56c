pub mod analysis;
pub mod cli;
pub mod config;
pub mod credential;
pub mod errors;
pub mod fallback;
pub mod logging;
pub mod normalize;
pub mod openai;
pub mod prompt;
pub mod storage;
pub mod types;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

pub use analysis::Analyzer;
pub use errors::{AnalysisError, PreconditionError};
pub use openai::{AnalysisConfig, VisionModel};
pub use types::{
    AnalysisMode, AnalysisRequest, AnalysisResult, DataUri, Gender, MuscleGroup, RatingSet,
    WorkoutEntry,
};
