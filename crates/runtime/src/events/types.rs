use serde::{Deserialize, Serialize};

use tabletop_core::{ActionOutcome, DecisionOutcome, EntityId, PendingDecision};

use crate::session::DecisionId;

/// Resolved combat results, published on both host and peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    ActionResolved {
        outcome: Box<ActionOutcome>,
        state_root: String,
    },
    DecisionPending {
        id: DecisionId,
        decision: PendingDecision,
    },
    DecisionResolved {
        id: DecisionId,
        outcome: Box<DecisionOutcome>,
    },
    /// A command or remote message the session refused.
    Rejected {
        command: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    InitiativeRolled { entity: EntityId, score: i32 },
    TurnStarted { entity: EntityId, round: u32 },
    CombatEnded,
}
