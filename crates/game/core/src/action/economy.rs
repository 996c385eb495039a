//! Turn economy actions: Dash, Disengage, Dodge and Hide.

use super::movement::effective_speed;
use super::{ActionOutcome, ActionReport, CombatTransition, Effects};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{CombatState, EntityId, Mutation, TurnError, TurnFlag};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EconomyKind {
    Dash,
    Disengage,
    Dodge,
    Hide,
}

impl EconomyKind {
    fn flag(self) -> TurnFlag {
        match self {
            Self::Dash => TurnFlag::Dashing,
            Self::Disengage => TurnFlag::Disengaging,
            Self::Dodge => TurnFlag::Dodging,
            Self::Hide => TurnFlag::Hidden,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EconomyAction {
    pub entity: EntityId,
    pub kind: EconomyKind,
    /// Taken as a bonus action (Cunning Action and similar).
    pub bonus_action: bool,
}

impl EconomyAction {
    pub fn new(entity: EntityId, kind: EconomyKind) -> Self {
        Self {
            entity,
            kind,
            bonus_action: false,
        }
    }

    pub fn as_bonus_action(mut self) -> Self {
        self.bonus_action = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EconomyReport {
    pub entity: EntityId,
    pub kind: EconomyKind,
    pub refused: Option<TurnError>,
}

impl CombatTransition for EconomyAction {
    fn actor(&self) -> EntityId {
        self.entity
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        _rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let entity = state.entity(self.entity)?;
        let mut effects = Effects::default();

        let refused = match state.resources_of(self.entity) {
            None => Some(TurnError::NotInInitiative(self.entity)),
            Some(_) if state.conditions_of(self.entity).is_incapacitated() => {
                Some(TurnError::CannotAct(self.entity))
            }
            Some(r) if self.bonus_action && r.bonus_action_used => Some(TurnError::BonusActionUsed(self.entity)),
            Some(r) if !self.bonus_action && r.action_used => Some(TurnError::ActionUsed(self.entity)),
            Some(_) => None,
        };
        if let Some(err) = &refused {
            effects.note(format!("{} cannot {}: {err}", entity.name, self.kind));
            return Some(ActionOutcome::new(
                self.entity,
                ActionReport::Economy(EconomyReport {
                    entity: self.entity,
                    kind: self.kind,
                    refused,
                }),
                effects,
            ));
        }

        effects.push(if self.bonus_action {
            Mutation::SpendBonusAction { entity: self.entity }
        } else {
            Mutation::SpendAction { entity: self.entity }
        });
        effects.push(Mutation::SetTurnFlag {
            entity: self.entity,
            flag: self.kind.flag(),
            value: true,
        });
        if self.kind == EconomyKind::Dash
            && let Some(resources) = state.resources_of(self.entity)
        {
            let speed = effective_speed(entity, &state.conditions_of(self.entity), env.rules());
            effects.push(Mutation::SetMovement {
                entity: self.entity,
                remaining: resources.movement_remaining + speed,
                max: resources.movement_max + speed,
            });
        }
        effects.note(format!("{} takes the {} action", entity.name, self.kind));

        Some(ActionOutcome::new(
            self.entity,
            ActionReport::Economy(EconomyReport {
                entity: self.entity,
                kind: self.kind,
                refused: None,
            }),
            effects,
        ))
    }
}
