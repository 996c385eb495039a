//! The write path into [`CombatState`](super::CombatState).
//!
//! Actions never touch the store directly; they return mutations. Each
//! mutation carries absolute values, so a peer applying the same resolved
//! outcome ends in the same state as the host that produced it.

use crate::state::turn::TurnFlag;
use crate::state::types::{ConditionInstance, ConditionKind, EntityId, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutation {
    SetPosition {
        entity: EntityId,
        position: Position,
    },
    SetHitPoints {
        entity: EntityId,
        current: u32,
        temporary: u32,
    },
    AddCondition(ConditionInstance),
    /// `source: None` removes every instance of the kind.
    RemoveCondition {
        entity: EntityId,
        kind: ConditionKind,
        source: Option<EntityId>,
    },
    SetMovement {
        entity: EntityId,
        remaining: u32,
        max: u32,
    },
    SpendAction {
        entity: EntityId,
    },
    SpendBonusAction {
        entity: EntityId,
    },
    SpendReaction {
        entity: EntityId,
    },
    SetTurnFlag {
        entity: EntityId,
        flag: TurnFlag,
        value: bool,
    },
    /// `None` ends concentration.
    SetConcentration {
        entity: EntityId,
        spell: Option<String>,
    },
    SetMount {
        rider: EntityId,
        mount: Option<EntityId>,
    },
    MarkSlain {
        entity: EntityId,
    },
}

impl Mutation {
    /// Token the mutation writes to.
    pub fn entity(&self) -> EntityId {
        match self {
            Self::SetPosition { entity, .. }
            | Self::SetHitPoints { entity, .. }
            | Self::RemoveCondition { entity, .. }
            | Self::SetMovement { entity, .. }
            | Self::SpendAction { entity }
            | Self::SpendBonusAction { entity }
            | Self::SpendReaction { entity }
            | Self::SetTurnFlag { entity, .. }
            | Self::SetConcentration { entity, .. }
            | Self::MarkSlain { entity } => *entity,
            Self::AddCondition(instance) => instance.entity,
            Self::SetMount { rider, .. } => *rider,
        }
    }
}
