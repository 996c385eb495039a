//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// No battle map is active.
    #[error("MapOracle not available")]
    MapNotAvailable,
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MapNotAvailable => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MapNotAvailable => "ORACLE_MAP_NOT_AVAILABLE",
        }
    }
}
