//! Area-of-effect damage: one damage roll, one save per creature caught.

use std::collections::BTreeSet;

use super::damage::{DamageHit, settle_damage};
use super::{ActionOutcome, ActionReport, CombatTransition, Effects, exhaustion_penalty};
use crate::combat::{
    DamageApplicationResult, DamageType, DiceExpr, DiceRoll, NaturalRule, SavingThrow, roll_saving_throw,
};
use crate::env::{CombatEnv, RandomSource};
use crate::geometry::{AreaShape, affected_cells};
use crate::state::{Ability, CombatState, EntityId, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaSave {
    pub ability: Ability,
    pub dc: i32,
    /// A successful save halves the damage (rounded down) instead of negating it.
    pub half_on_success: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaEffectAction {
    pub caster: EntityId,
    pub shape: AreaShape,
    /// Dice expression, e.g. `8d6`. Malformed text rolls nothing.
    pub damage: String,
    pub damage_type: DamageType,
    pub save: Option<AreaSave>,
    pub source_name: String,
    pub underwater: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaTargetResult {
    pub entity: EntityId,
    pub save: Option<SavingThrow>,
    /// `None` when a save negated the damage.
    pub applied: Option<DamageApplicationResult>,
    pub concentration: Option<SavingThrow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaReport {
    pub cells: BTreeSet<Position>,
    pub roll: DiceRoll,
    pub targets: Vec<AreaTargetResult>,
}

impl CombatTransition for AreaEffectAction {
    fn actor(&self) -> EntityId {
        self.caster
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let caster = state.entity(self.caster)?;
        let rules = env.rules();
        let cells = affected_cells(&self.shape, rules.feet_per_cell);
        let roll = DiceExpr::parse_or_zero(&self.damage).roll(rng);
        let full = roll.total.max(0) as u32;

        let mut effects = Effects::default();
        effects.note(format!(
            "{} uses {}: {} = {full} {} damage",
            caster.name, self.source_name, self.damage, self.damage_type
        ));

        let caught: Vec<_> = state
            .entities
            .iter()
            .filter(|entity| !entity.slain)
            .filter(|entity| entity.footprint().cells().any(|cell| cells.contains(&cell)))
            .collect();

        let mut targets = Vec::with_capacity(caught.len());
        for target in caught {
            let save = self.save.map(|save| {
                roll_saving_throw(
                    target,
                    save.ability,
                    save.dc,
                    exhaustion_penalty(state, env, target.id),
                    NaturalRule::TotalOnly,
                    rng,
                )
            });
            let amount = match (save, self.save) {
                (Some(result), Some(spec)) if result.success => {
                    effects.note(format!(
                        "{} saves ({} {} vs DC {})",
                        target.name,
                        result.ability.abbreviation(),
                        result.total,
                        result.dc
                    ));
                    if spec.half_on_success { full / 2 } else { 0 }
                }
                (Some(result), _) => {
                    effects.note(format!(
                        "{} fails ({} {} vs DC {})",
                        target.name,
                        result.ability.abbreviation(),
                        result.total,
                        result.dc
                    ));
                    full
                }
                _ => full,
            };

            let mut result = AreaTargetResult {
                entity: target.id,
                save,
                applied: None,
                concentration: None,
            };
            if amount > 0 {
                let settled = settle_damage(
                    state,
                    env,
                    DamageHit {
                        attacker: None,
                        target,
                        amount,
                        damage_type: self.damage_type,
                        melee: false,
                        underwater: self.underwater,
                    },
                    rng,
                    &mut effects,
                );
                result.applied = Some(settled.applied);
                result.concentration = settled.concentration;
            }
            targets.push(result);
        }

        Some(ActionOutcome::new(
            self.caster,
            ActionReport::Area(AreaReport { cells, roll, targets }),
            effects,
        ))
    }
}
