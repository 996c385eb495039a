//! Initiative order and per-combatant resources for the current round.

use std::collections::BTreeMap;

use crate::error::{ErrorSeverity, GameError};
use crate::state::types::EntityId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnError {
    #[error("{0} is not in initiative")]
    NotInInitiative(EntityId),

    #[error("{0} is already in initiative")]
    AlreadyInInitiative(EntityId),

    #[error("{0} has already used its action this turn")]
    ActionUsed(EntityId),

    #[error("{0} has already used its bonus action this turn")]
    BonusActionUsed(EntityId),

    #[error("{0} has already used its reaction this round")]
    ReactionUsed(EntityId),

    #[error("{0} cannot act")]
    CannotAct(EntityId),

    #[error("no combatants in initiative")]
    NoCombatants,
}

impl GameError for TurnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActionUsed(_)
            | Self::BonusActionUsed(_)
            | Self::ReactionUsed(_)
            | Self::CannotAct(_) => ErrorSeverity::Recoverable,
            Self::NotInInitiative(_) | Self::AlreadyInInitiative(_) | Self::NoCombatants => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotInInitiative(_) => "TURN_NOT_IN_INITIATIVE",
            Self::AlreadyInInitiative(_) => "TURN_ALREADY_IN_INITIATIVE",
            Self::ActionUsed(_) => "TURN_ACTION_USED",
            Self::BonusActionUsed(_) => "TURN_BONUS_ACTION_USED",
            Self::ReactionUsed(_) => "TURN_REACTION_USED",
            Self::CannotAct(_) => "TURN_CANNOT_ACT",
            Self::NoCombatants => "TURN_NO_COMBATANTS",
        }
    }
}

/// Turn-scoped toggles set by economy actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnFlag {
    Dashing,
    Disengaging,
    Dodging,
    Hidden,
}

/// Resources one combatant has left this round.
///
/// Everything here resets only at the start of the owner's own turn, so a
/// reaction spent on someone else's turn stays spent until then.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnResourceState {
    pub movement_remaining: u32,
    pub movement_max: u32,
    pub action_used: bool,
    pub bonus_action_used: bool,
    pub reaction_used: bool,
    pub is_dashing: bool,
    pub is_disengaging: bool,
    pub is_dodging: bool,
    pub is_hidden: bool,
    pub concentrating_on: Option<String>,
    pub mounted_on: Option<EntityId>,
}

impl TurnResourceState {
    pub fn new(movement_max: u32) -> Self {
        Self {
            movement_remaining: movement_max,
            movement_max,
            ..Self::default()
        }
    }

    /// Start-of-turn refresh. Concentration and mount links carry over.
    pub fn reset_for_turn(&mut self, movement_max: u32) {
        *self = Self {
            concentrating_on: self.concentrating_on.take(),
            mounted_on: self.mounted_on,
            ..Self::new(movement_max)
        };
    }

    /// Sets the movement budget, keeping `remaining <= max`.
    pub fn set_movement(&mut self, remaining: u32, max: u32) {
        self.movement_max = max;
        self.movement_remaining = remaining.min(max);
    }

    pub fn flag(&self, flag: TurnFlag) -> bool {
        match flag {
            TurnFlag::Dashing => self.is_dashing,
            TurnFlag::Disengaging => self.is_disengaging,
            TurnFlag::Dodging => self.is_dodging,
            TurnFlag::Hidden => self.is_hidden,
        }
    }

    pub fn set_flag(&mut self, flag: TurnFlag, value: bool) {
        match flag {
            TurnFlag::Dashing => self.is_dashing = value,
            TurnFlag::Disengaging => self.is_disengaging = value,
            TurnFlag::Dodging => self.is_dodging = value,
            TurnFlag::Hidden => self.is_hidden = value,
        }
    }

    /// True until the owner has moved or spent anything this turn.
    pub fn is_fresh(&self) -> bool {
        self.movement_remaining == self.movement_max
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitiativeEntry {
    pub entity: EntityId,
    pub initiative: i32,
}

/// Initiative order, round counter and resources of everyone in combat.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnResourceTracker {
    resources: BTreeMap<EntityId, TurnResourceState>,
    /// Descending initiative, ties broken by ascending id.
    order: Vec<InitiativeEntry>,
    active: Option<EntityId>,
    /// Slot of an active entity removed mid-turn. The next advance resumes
    /// after it.
    vacated: Option<InitiativeEntry>,
    round: u32,
}

impl TurnResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: EntityId, initiative: i32, movement_max: u32) -> Result<(), TurnError> {
        if self.resources.contains_key(&entity) {
            return Err(TurnError::AlreadyInInitiative(entity));
        }
        self.resources.insert(entity, TurnResourceState::new(movement_max));
        self.order.push(InitiativeEntry { entity, initiative });
        self.order
            .sort_by(|a, b| b.initiative.cmp(&a.initiative).then(a.entity.cmp(&b.entity)));
        Ok(())
    }

    /// Drops an entity from initiative. If it was active, nobody is active
    /// until the next advance, which picks up with whoever followed it.
    pub fn remove(&mut self, entity: EntityId) -> Option<TurnResourceState> {
        let removed = self.resources.remove(&entity)?;
        let slot = self.order.iter().find(|entry| entry.entity == entity).copied();
        self.order.retain(|entry| entry.entity != entity);
        if self.active == Some(entity) {
            self.active = None;
            self.vacated = slot;
        }
        Some(removed)
    }

    pub fn get(&self, entity: EntityId) -> Option<&TurnResourceState> {
        self.resources.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut TurnResourceState> {
        self.resources.get_mut(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.resources.contains_key(&entity)
    }

    pub fn order(&self) -> &[InitiativeEntry] {
        &self.order
    }

    pub fn active(&self) -> Option<EntityId> {
        self.active
    }

    pub fn set_active(&mut self, entity: Option<EntityId>) {
        self.active = entity;
        self.vacated = None;
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entity after the active one, and whether the order wrapped around.
    ///
    /// With nobody active the first entry comes next and counts as a wrap,
    /// unless the active entity was removed mid-turn: then its successor in
    /// the order comes next.
    pub fn next_in_order(&self) -> Option<(EntityId, bool)> {
        let first = self.order.first()?.entity;
        let Some(active) = self.active else {
            let successor = self.vacated.and_then(|slot| {
                self.order.iter().find(|entry| {
                    entry.initiative < slot.initiative
                        || (entry.initiative == slot.initiative && entry.entity > slot.entity)
                })
            });
            return Some(match successor {
                Some(next) => (next.entity, false),
                None => (first, true),
            });
        };
        let index = self.order.iter().position(|entry| entry.entity == active);
        match index.and_then(|i| self.order.get(i + 1)) {
            Some(next) => Some((next.entity, false)),
            None => Some((first, true)),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
