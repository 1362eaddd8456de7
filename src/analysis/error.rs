use thiserror::Error;

/// Message shown to callers for any internal failure.
pub const GENERIC_FAILURE: &str = "Failed to perform analysis";

/// Errors surfaced by the analysis engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Required input missing or malformed. The message is safe to show.
    #[error("{0}")]
    Validation(String),

    /// Something went wrong inside a calculator. Detail is for logs only.
    #[error("analysis computation failed: {0}")]
    Computation(String),
}

impl AnalysisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    /// Text that may be returned to an external caller.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
            Self::Computation(_) => GENERIC_FAILURE,
        }
    }
}
