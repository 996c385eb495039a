//! Errors raised while applying mutations to the combat store.

use crate::error::{ErrorSeverity, GameError};
use crate::state::conditions::ConditionError;
use crate::state::types::EntityId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A mutation names a token the store does not hold. On a peer this
    /// means the replicated stream and the local roster diverged.
    #[error("entity {0} is not on the map")]
    EntityNotFound(EntityId),

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

impl GameError for StateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EntityNotFound(_) => ErrorSeverity::Internal,
            Self::Condition(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EntityNotFound(_) => "STATE_ENTITY_NOT_FOUND",
            Self::Condition(err) => err.error_code(),
        }
    }
}
