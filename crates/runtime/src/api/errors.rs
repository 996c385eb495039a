//! Unified error types surfaced by the runtime API.
//!
//! Wraps engine, protocol and interaction failures plus the channel plumbing
//! between [`RuntimeHandle`](super::RuntimeHandle) and the session worker.

use thiserror::Error;
use tokio::sync::oneshot;

use tabletop_core::{EntityId, ErrorSeverity, ExecuteError, GameError};
use tabletop_core::combat::DiceParseError;

use crate::interaction::InteractionError;
use crate::protocol::ProtocolError;
use crate::session::DecisionId;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("only the host can {0}")]
    NotHost(&'static str),

    #[error("the host does not apply remote state updates")]
    NotPeer,

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error("no pending decision with id {0}")]
    UnknownDecision(DecisionId),

    #[error("entity {0} is not in this session")]
    UnknownEntity(EntityId),

    #[error(transparent)]
    Dice(#[from] DiceParseError),

    #[error("state diverged from host: expected root {expected}, computed {actual}")]
    StateDiverged { expected: String, actual: String },

    #[error("host started {expected}'s turn but this peer advanced to {actual}")]
    TurnMismatch { expected: EntityId, actual: EntityId },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Interaction(#[from] InteractionError),

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires an encounter (state, map and rules) before building")]
    MissingEncounter,
}

impl RuntimeError {
    /// Severity for reporting. Engine errors keep the classification of the
    /// rule that refused them.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Execute(err) => err.severity(),
            Self::StateDiverged { .. } | Self::TurnMismatch { .. } => ErrorSeverity::Fatal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => ErrorSeverity::Internal,
            Self::Interaction(InteractionError::StaleRoll) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }
}
