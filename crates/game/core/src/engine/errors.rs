//! Error types for the execution pipeline.

use crate::action::DecisionError;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{StateError, TurnError};

/// Errors surfaced while committing outcomes or running the turn loop.
///
/// Rules edge cases never land here; they come back as reports inside the
/// outcome. These are misuse of the engine API.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    #[error("commit failed: {0}")]
    State(#[from] StateError),

    #[error("turn error: {0}")]
    Turn(#[from] TurnError),

    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),
}

impl GameError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::State(err) => err.severity(),
            Self::Turn(err) => err.severity(),
            Self::Decision(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::State(err) => err.error_code(),
            Self::Turn(err) => err.error_code(),
            Self::Decision(err) => err.error_code(),
        }
    }
}
