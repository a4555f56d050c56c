use crate::types::ImageView;
use thiserror::Error;

/// Caller misuse detected before any network traffic. This is the only
/// failure `analyze` hands back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("{0} image is required")]
    MissingImage(ImageView),
    #[error("gender is required")]
    MissingGender,
    #[error("prompt is empty")]
    EmptyPrompt,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("format error: {0}")]
    Format(String),
}

impl AnalysisError {
    /// Transport and format failures both mean "analysis unavailable" and
    /// are absorbed by the fallback generator.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, AnalysisError::Precondition(_))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Transport(format!("request timed out: {e}"))
        } else if e.is_decode() {
            AnalysisError::Format(e.to_string())
        } else {
            AnalysisError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> AnalysisError {
        AnalysisError::Format(e.to_string())
    }
}
