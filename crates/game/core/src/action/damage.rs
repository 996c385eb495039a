//! Direct damage, and the path every source of damage settles through.

use super::{ActionOutcome, ActionReport, CombatTransition, Effects, PendingDecision, exhaustion_penalty};
use crate::combat::{DamageApplicationResult, DamageType, SavingThrow, apply_damage, concentration_check, type_modifiers};
use crate::env::{CombatEnv, RandomSource};
use crate::state::{
    CombatEntity, CombatState, ConditionDuration, ConditionInstance, ConditionKind, EntityId, Faction, Mutation,
};

/// Damage from outside the attack pipeline (falling, traps, a GM ruling).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageAction {
    pub target: EntityId,
    pub amount: u32,
    pub damage_type: DamageType,
    pub source_name: String,
    pub underwater: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    pub target: EntityId,
    pub applied: DamageApplicationResult,
    pub concentration: Option<SavingThrow>,
}

impl CombatTransition for DamageAction {
    fn actor(&self) -> EntityId {
        self.target
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let target = state.entity(self.target)?;
        let mut effects = Effects::default();
        effects.note(format!("{} hits {}", self.source_name, target.name));
        let settled = settle_damage(
            state,
            env,
            DamageHit {
                attacker: None,
                target,
                amount: self.amount,
                damage_type: self.damage_type,
                melee: false,
                underwater: self.underwater,
            },
            rng,
            &mut effects,
        );
        Some(ActionOutcome::new(
            self.target,
            ActionReport::Damage(DamageReport {
                target: self.target,
                applied: settled.applied,
                concentration: settled.concentration,
            }),
            effects,
        ))
    }
}

pub(crate) struct DamageHit<'a> {
    pub attacker: Option<EntityId>,
    pub target: &'a CombatEntity,
    pub amount: u32,
    pub damage_type: DamageType,
    pub melee: bool,
    pub underwater: bool,
}

pub(crate) struct Settled {
    pub applied: DamageApplicationResult,
    pub concentration: Option<SavingThrow>,
    /// The target is out of the fight (dying, unconscious or slain).
    pub target_down: bool,
}

/// Applies one batch of typed damage and everything that follows from it.
///
/// - hit points and temporary hit points are written as absolute values
/// - a melee drop to 0 without instant death opens a knockout decision
/// - otherwise, at 0 players fall unconscious and everyone else is slain
/// - instant death slays regardless of faction
/// - a concentrating target loses focus at 0, or saves to keep it
pub(crate) fn settle_damage(
    state: &CombatState,
    env: &CombatEnv<'_>,
    hit: DamageHit<'_>,
    rng: &mut dyn RandomSource,
    effects: &mut Effects,
) -> Settled {
    let target = hit.target;
    let modifiers = type_modifiers(target, hit.damage_type, hit.underwater);
    let applied = apply_damage(&target.hit_points, modifiers, hit.amount, hit.damage_type, hit.melee);

    effects.push(Mutation::SetHitPoints {
        entity: target.id,
        current: applied.hit_points,
        temporary: applied.temporary_hit_points,
    });
    let note = if applied.modifier_description.is_empty() {
        String::new()
    } else {
        format!(" ({})", applied.modifier_description)
    };
    effects.note(format!(
        "{} takes {} {} damage{} [{} -> {} HP]",
        target.name, applied.effective, applied.damage_type, note, target.hit_points.current, applied.hit_points
    ));

    let mut target_down = false;
    if applied.dropped_to_zero() {
        target_down = true;
        let monster = target.faction == Faction::Enemy;
        if applied.instant_death {
            effects.push(Mutation::MarkSlain { entity: target.id });
            effects.note(format!("{} is killed outright", target.name));
        } else if let (true, Some(attacker)) = (applied.reduced_to_zero, hit.attacker) {
            effects.pending = Some(PendingDecision::knockout(attacker, target.id, monster));
            effects.note(format!("{} drops to 0 hit points: knock out or kill?", target.name));
        } else if monster {
            effects.push(Mutation::MarkSlain { entity: target.id });
            effects.note(format!("{} is slain", target.name));
        } else {
            effects.push(Mutation::AddCondition(ConditionInstance::new(
                target.id,
                ConditionKind::Unconscious,
                ConditionDuration::Permanent,
                "0 hit points",
            )));
            effects.note(format!("{} falls unconscious", target.name));
        }
    }

    let concentrating = state
        .resources_of(target.id)
        .and_then(|resources| resources.concentrating_on.as_deref());
    let mut concentration = None;
    if let Some(spell) = concentrating
        && applied.effective > 0
    {
        let keeps = if target_down {
            false
        } else {
            let save = concentration_check(
                target,
                applied.effective,
                exhaustion_penalty(state, env, target.id),
                env.rules(),
                rng,
            );
            concentration = Some(save);
            save.success
        };
        if keeps {
            effects.note(format!("{} keeps concentrating on {spell}", target.name));
        } else {
            effects.push(Mutation::SetConcentration {
                entity: target.id,
                spell: None,
            });
            effects.note(format!("{} loses concentration on {spell}", target.name));
        }
    }

    Settled {
        applied,
        concentration,
        target_down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SequenceRng;
    use crate::state::{AbilityScores, HitPoints, Position};

    fn state() -> CombatState {
        let mut state = CombatState::with_entities([
            CombatEntity::new(EntityId(1), "Wizard", Faction::Player, Position::ORIGIN)
                .with_hit_points(HitPoints::new(20))
                .with_abilities(AbilityScores::new(8, 14, 12, 16, 10, 10)),
            CombatEntity::new(EntityId(2), "Zombie", Faction::Enemy, Position::new(3, 0))
                .with_hit_points(HitPoints::new(6)),
            CombatEntity::new(EntityId(4), "Guide", Faction::Npc, Position::new(0, 3))
                .with_hit_points(HitPoints::new(6)),
        ]);
        state.turns.add(EntityId(1), 12, 30).unwrap();
        state
            .apply(&Mutation::SetConcentration {
                entity: EntityId(1),
                spell: Some("Bless".into()),
            })
            .unwrap();
        state
    }

    fn hit(target: EntityId, amount: u32) -> DamageAction {
        DamageAction {
            target,
            amount,
            damage_type: DamageType::Fire,
            source_name: "trap".into(),
            underwater: false,
        }
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let state = state();
        let env = CombatEnv::empty();
        assert!(hit(EntityId(9), 5).resolve(&state, &env, &mut SequenceRng::new([10])).is_none());
    }

    #[test]
    fn concentration_save_on_damage() {
        let state = state();
        let env = CombatEnv::empty();
        let outcome = hit(EntityId(1), 6)
            .resolve(&state, &env, &mut SequenceRng::new([5]))
            .unwrap();
        let ActionReport::Damage(report) = &outcome.report else {
            panic!("expected damage report");
        };
        // 5 + CON 1 = 6 < DC 10
        assert_eq!(report.concentration.map(|save| save.success), Some(false));
        assert!(outcome.mutations.contains(&Mutation::SetConcentration {
            entity: EntityId(1),
            spell: None
        }));
    }

    #[test]
    fn monsters_dropped_outside_melee_are_slain() {
        let state = state();
        let env = CombatEnv::empty();
        let outcome = hit(EntityId(2), 8).resolve(&state, &env, &mut SequenceRng::new([1])).unwrap();
        assert!(outcome.pending.is_none());
        assert!(outcome.mutations.contains(&Mutation::MarkSlain { entity: EntityId(2) }));
    }

    #[test]
    fn players_fall_unconscious() {
        let state = state();
        let env = CombatEnv::empty();
        let outcome = hit(EntityId(1), 25).resolve(&state, &env, &mut SequenceRng::new([20])).unwrap();
        assert!(outcome.mutations.iter().any(|m| matches!(
            m,
            Mutation::AddCondition(c) if c.kind == ConditionKind::Unconscious
        )));
        // dropping to 0 ends concentration without a save
        let ActionReport::Damage(report) = &outcome.report else {
            panic!("expected damage report");
        };
        assert!(report.concentration.is_none());
        assert!(outcome.mutations.contains(&Mutation::SetConcentration {
            entity: EntityId(1),
            spell: None
        }));
    }

    #[test]
    fn npcs_fall_unconscious_instead_of_dying() {
        let state = state();
        let env = CombatEnv::empty();
        let outcome = hit(EntityId(4), 8).resolve(&state, &env, &mut SequenceRng::new([1])).unwrap();
        assert!(!outcome.mutations.contains(&Mutation::MarkSlain { entity: EntityId(4) }));
        assert!(outcome.mutations.iter().any(|m| matches!(
            m,
            Mutation::AddCondition(c) if c.entity == EntityId(4) && c.kind == ConditionKind::Unconscious
        )));
    }
}
