//! Step-by-step interaction flows a UI drives one input at a time.
//!
//! Each flow is an explicit state enum. Every state accepts exactly one kind
//! of input (plus `Cancel`); anything else is an [`InteractionError`] and
//! leaves the flow where it was.
//!
//! - [`AttackFlow`]: weapon-select → target-select → roll → damage → result
//! - [`ContestFlow`]: target-select → save-roll → done, for grapple and shove

mod attack;
mod contest;

pub use attack::{AttackFlow, AttackInput, AttackStep};
pub use contest::{ContestFlow, ContestInput, ContestStep};

use thiserror::Error;

use tabletop_core::EntityId;

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("`{input}` is not accepted during {step}")]
    UnexpectedInput { step: &'static str, input: &'static str },

    #[error("the interaction has already finished")]
    Finished,

    #[error("entity {0} is not on the map")]
    UnknownEntity(EntityId),

    #[error("{attacker} does not carry `{weapon}`")]
    UnknownWeapon { attacker: EntityId, weapon: String },

    #[error("{0} cannot be targeted")]
    InvalidTarget(EntityId),

    #[error("the state changed after the roll; roll again")]
    StaleRoll,

    #[error("the action could not be resolved")]
    Unresolvable,
}

/// Checks that `target` is a living token other than `actor`.
fn validate_target(session: &Session, actor: EntityId, target: EntityId) -> Result<(), InteractionError> {
    let token = session
        .state()
        .entity(target)
        .ok_or(InteractionError::UnknownEntity(target))?;
    if target == actor || token.slain {
        return Err(InteractionError::InvalidTarget(target));
    }
    Ok(())
}
