//! Starting and dropping concentration on a spell.

use super::{ActionOutcome, ActionReport, CombatTransition, Effects};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{CombatState, EntityId, Mutation};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcentrationAction {
    pub entity: EntityId,
    /// `None` drops concentration.
    pub spell: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcentrationReport {
    pub entity: EntityId,
    /// Spell given up, including one replaced by the new spell.
    pub dropped: Option<String>,
    pub started: Option<String>,
    /// Incapacitated casters cannot concentrate.
    pub refused: bool,
}

impl CombatTransition for ConcentrationAction {
    fn actor(&self) -> EntityId {
        self.entity
    }

    fn resolve(
        &self,
        state: &CombatState,
        _env: &CombatEnv<'_>,
        _rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let caster = state.entity(self.entity)?;
        let current = state
            .resources_of(self.entity)
            .and_then(|r| r.concentrating_on.clone());
        let mut effects = Effects::default();
        let mut report = ConcentrationReport {
            entity: self.entity,
            dropped: None,
            started: None,
            refused: false,
        };

        if self.spell.is_some() && state.conditions_of(self.entity).is_incapacitated() {
            report.refused = true;
            effects.note(format!("{} cannot concentrate", caster.name));
            return Some(ActionOutcome::new(self.entity, ActionReport::Concentration(report), effects));
        }
        if current == self.spell {
            return Some(ActionOutcome::new(self.entity, ActionReport::Concentration(report), effects));
        }

        effects.push(Mutation::SetConcentration {
            entity: self.entity,
            spell: self.spell.clone(),
        });
        if let Some(old) = &current {
            effects.note(format!("{} stops concentrating on {old}", caster.name));
        }
        if let Some(new) = &self.spell {
            effects.note(format!("{} concentrates on {new}", caster.name));
        }
        report.dropped = current;
        report.started = self.spell.clone();
        Some(ActionOutcome::new(self.entity, ActionReport::Concentration(report), effects))
    }
}
