//! The attack action: weapon, improvised and unarmed attacks.
//!
//! Resolution reads the store, rolls through [`crate::combat`], and turns
//! the result into mutations: economy, consumed riders, damage, knockout
//! decisions, mastery effects and concentration.

use super::damage::{DamageHit, settle_damage};
use super::movement::{forced_destination, relocate};
use super::{ActionOutcome, ActionReport, CombatTransition, Effects, exhaustion_penalty};
use crate::combat::{
    AttackContext, AttackOptions, AttackRoll, AttackStatus, ContestOutcome, DamageApplicationResult, DamageRoll,
    MasteryEffect, NaturalRule, RangeBand, RangeClass, RollInputs, SavingThrow, ShoveChoice, Situation,
    UnarmedMode, mastery_effect, push_path, range_band, range_class, resolve_contest, resolve_roll_modifiers,
    roll_attack, roll_damage, roll_saving_throw,
};
use crate::env::{CombatEnv, RandomSource};
use crate::geometry::{CoverCategory, calculate_cover};
use crate::state::{
    Ability, CombatEntity, CombatState, ConditionDuration, ConditionInstance, ConditionKind, EntityId, Mutation,
    TurnFlag, Weapon,
};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponChoice {
    /// A weapon the attacker carries, matched by name.
    Named(String),
    Unarmed { mode: UnarmedMode, shove: ShoveChoice },
    Improvised,
}

impl WeaponChoice {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn unarmed(mode: UnarmedMode) -> Self {
        Self::Unarmed {
            mode,
            shove: ShoveChoice::default(),
        }
    }

    fn weapon(&self, attacker: &CombatEntity) -> Option<Weapon> {
        match self {
            Self::Named(name) => attacker.weapon(name).cloned(),
            Self::Unarmed { .. } => Some(Weapon::unarmed_strike()),
            Self::Improvised => Some(Weapon::improvised()),
        }
    }
}

/// Which part of the turn economy the attack uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionCost {
    #[default]
    Action,
    BonusAction,
    Reaction,
    /// Extra Attack and similar follow-ups.
    Free,
}

impl ActionCost {
    pub(crate) fn mutation(self, entity: EntityId) -> Option<Mutation> {
        match self {
            Self::Action => Some(Mutation::SpendAction { entity }),
            Self::BonusAction => Some(Mutation::SpendBonusAction { entity }),
            Self::Reaction => Some(Mutation::SpendReaction { entity }),
            Self::Free => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackAction {
    pub attacker: EntityId,
    pub target: EntityId,
    pub weapon: WeaponChoice,
    pub options: AttackOptions,
    pub cost: ActionCost,
    pub underwater: bool,
    /// Reaction to the target leaving reach. Reach was checked where the
    /// target stood when it provoked, so it is not checked again.
    #[cfg_attr(feature = "serde", serde(default))]
    pub opportunity: bool,
}

impl AttackAction {
    pub fn new(attacker: EntityId, target: EntityId, weapon: WeaponChoice) -> Self {
        Self {
            attacker,
            target,
            weapon,
            options: AttackOptions::default(),
            cost: ActionCost::default(),
            underwater: false,
            opportunity: false,
        }
    }

    /// An opportunity attack, paid for with the reaction.
    pub fn opportunity(attacker: EntityId, target: EntityId, weapon: WeaponChoice) -> Self {
        Self {
            cost: ActionCost::Reaction,
            opportunity: true,
            ..Self::new(attacker, target, weapon)
        }
    }

    pub fn with_options(mut self, options: AttackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cost(mut self, cost: ActionCost) -> Self {
        self.cost = cost;
        self
    }

    pub fn underwater(mut self, underwater: bool) -> Self {
        self.underwater = underwater;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackReport {
    pub attacker: EntityId,
    pub target: EntityId,
    pub weapon: String,
    /// `None` for grapple and shove, which use a contest instead.
    pub roll: Option<AttackRoll>,
    pub contest: Option<ContestOutcome>,
    pub damage: Option<DamageRoll>,
    pub applied: Option<DamageApplicationResult>,
    pub mastery: Option<MasteryEffect>,
    pub mastery_save: Option<SavingThrow>,
    pub concentration: Option<SavingThrow>,
}

impl AttackReport {
    fn new(action: &AttackAction, weapon: &Weapon) -> Self {
        Self {
            attacker: action.attacker,
            target: action.target,
            weapon: weapon.name.clone(),
            roll: None,
            contest: None,
            damage: None,
            applied: None,
            mastery: None,
            mastery_save: None,
            concentration: None,
        }
    }

    pub fn hit(&self) -> bool {
        self.roll.as_ref().is_some_and(|roll| roll.hit) || self.contest.is_some_and(|c| c.succeeded())
    }
}

impl CombatTransition for AttackAction {
    fn actor(&self) -> EntityId {
        self.attacker
    }

    fn resolve(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionOutcome> {
        let attacker = state.entity(self.attacker)?;
        let target = state.entity(self.target)?;
        if attacker.slain || target.slain {
            return None;
        }
        let weapon = self.weapon.weapon(attacker)?;

        let mut effects = Effects::default();
        let mut report = AttackReport::new(self, &weapon);
        match &self.weapon {
            WeaponChoice::Unarmed {
                mode: mode @ (UnarmedMode::Grapple | UnarmedMode::Shove),
                shove,
            } => self.contest(state, env, attacker, target, *mode, *shove, rng, &mut report, &mut effects),
            _ => self.strike(state, env, attacker, target, &weapon, rng, &mut report, &mut effects),
        }
        Some(ActionOutcome::new(
            self.attacker,
            ActionReport::Attack(Box::new(report)),
            effects,
        ))
    }
}

impl AttackAction {
    fn spend(&self, state: &CombatState, attacker: &CombatEntity, effects: &mut Effects) {
        if let Some(spend) = self.cost.mutation(attacker.id) {
            effects.push(spend);
        }
        if state.resources_of(attacker.id).is_some_and(|r| r.is_hidden) {
            effects.push(Mutation::SetTurnFlag {
                entity: attacker.id,
                flag: TurnFlag::Hidden,
                value: false,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn contest(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        attacker: &CombatEntity,
        target: &CombatEntity,
        mode: UnarmedMode,
        shove: ShoveChoice,
        rng: &mut dyn RandomSource,
        report: &mut AttackReport,
        effects: &mut Effects,
    ) {
        let rules = env.rules();
        if state.conditions_of(attacker.id).is_incapacitated() {
            effects.note(format!("{} cannot act", attacker.name));
            return;
        }
        let gap = rules.feet_for(attacker.footprint().gap(&target.footprint()));
        if !self.opportunity && gap > Weapon::unarmed_strike().reach_feet() {
            effects.note(format!("{} is out of reach", target.name));
            return;
        }

        let outcome = resolve_contest(attacker, target, exhaustion_penalty(state, env, target.id), rng);
        report.contest = Some(outcome);
        let ContestOutcome::Resolved(save) = outcome else {
            effects.note(format!("{} is too large to {mode}", target.name));
            return;
        };
        self.spend(state, attacker, effects);
        effects.note(format!(
            "{} tries to {mode} {}: {} save {} + {} = {} vs DC {}",
            attacker.name,
            target.name,
            save.ability.abbreviation(),
            save.natural,
            save.bonus,
            save.total,
            save.dc
        ));
        if save.success {
            effects.note(format!("{} resists", target.name));
            return;
        }

        match (mode, shove) {
            (UnarmedMode::Grapple, _) => {
                effects.push(Mutation::AddCondition(
                    ConditionInstance::permanent(target.id, ConditionKind::Grappled, "Grapple").with_source(attacker.id),
                ));
                effects.note(format!("{} is grappled by {}", target.name, attacker.name));
            }
            (_, ShoveChoice::Prone) => {
                effects.push(Mutation::AddCondition(
                    ConditionInstance::permanent(target.id, ConditionKind::Prone, "Shove").with_source(attacker.id),
                ));
                effects.note(format!("{} is knocked prone", target.name));
            }
            (_, ShoveChoice::Push) => {
                let cells = rules.cells_for(rules.shove_feet);
                push(state, env, attacker, target, cells, effects);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn strike(
        &self,
        state: &CombatState,
        env: &CombatEnv<'_>,
        attacker: &CombatEntity,
        target: &CombatEntity,
        weapon: &Weapon,
        rng: &mut dyn RandomSource,
        report: &mut AttackReport,
        effects: &mut Effects,
    ) {
        let rules = env.rules();
        let attacker_fp = attacker.footprint();
        let target_fp = target.footprint();
        let distance_feet = rules.feet_for(attacker_fp.gap(&target_fp));
        let class = range_class(weapon, &self.options);
        let reach = weapon.reach_feet();
        let within_reach = self.opportunity || distance_feet <= reach;
        let hostile_in_reach = state.entities.iter().any(|other| {
            other.id != attacker.id
                && !other.slain
                && other.is_hostile_to(attacker)
                && !state.conditions_of(other.id).is_incapacitated()
                && rules.feet_for(other.footprint().gap(&attacker_fp)) <= rules.feet_per_cell
        });

        let blockers = state.entities.blocking_footprints(&[attacker.id, target.id]);
        let cover = calculate_cover(&attacker_fp, &target_fp, env.walls(), &blockers);
        let fear_source_in_sight = state
            .conditions_of(attacker.id)
            .iter()
            .filter(|c| c.kind == ConditionKind::Frightened)
            .any(|fear| match fear.source {
                None => true,
                Some(id) => state.entity(id).is_some_and(|source| {
                    !source.slain
                        && calculate_cover(&attacker_fp, &source.footprint(), env.walls(), &[]) != CoverCategory::Total
                }),
            });
        let attacker_resources = state.resources_of(attacker.id);
        let target_resources = state.resources_of(target.id);
        let inputs = RollInputs {
            attacker: attacker.id,
            target: target.id,
            attacker_conditions: state.conditions_of(attacker.id),
            target_conditions: state.conditions_of(target.id),
            range: class,
            within_reach,
            hostile_in_reach,
            target_dodging: target_resources.is_some_and(|r| r.is_dodging),
            attacker_hidden: attacker_resources.is_some_and(|r| r.is_hidden),
            target_hidden: target_resources.is_some_and(|r| r.is_hidden),
            beyond_normal_range: class == RangeClass::Ranged && range_band(weapon, distance_feet) == RangeBand::Long,
            fear_source_in_sight,
        };
        let ctx = AttackContext {
            attacker,
            target,
            weapon,
            cover,
            options: &self.options,
            situation: Situation {
                underwater: self.underwater,
                distance_feet,
                within_reach,
                hostile_in_reach,
            },
            modifiers: resolve_roll_modifiers(&inputs, rules),
        };

        let roll = roll_attack(&ctx, rules, rng);
        let status = roll.status;
        let (hit, is_crit) = (roll.hit, roll.is_crit);
        self.log_roll(attacker, target, weapon, &roll, effects);
        report.roll = Some(roll);
        match status {
            AttackStatus::CannotAct | AttackStatus::Untargetable | AttackStatus::OutOfRange => return,
            AttackStatus::AutoMiss | AttackStatus::Rolled => {}
        }

        self.spend(state, attacker, effects);
        if status == AttackStatus::Rolled {
            if state.conditions.has_from(target.id, ConditionKind::Vexed, attacker.id) {
                effects.push(Mutation::RemoveCondition {
                    entity: target.id,
                    kind: ConditionKind::Vexed,
                    source: Some(attacker.id),
                });
            }
            if state.conditions.has(attacker.id, ConditionKind::Sapped) {
                effects.push(Mutation::RemoveCondition {
                    entity: attacker.id,
                    kind: ConditionKind::Sapped,
                    source: None,
                });
            }
        }

        let mut dealt = 0;
        let mut target_down = false;
        if hit {
            let damage = roll_damage(&ctx, is_crit, rules, rng);
            let settled = settle_damage(
                state,
                env,
                DamageHit {
                    attacker: Some(attacker.id),
                    target,
                    amount: damage.total,
                    damage_type: weapon.damage_type,
                    melee: class == RangeClass::Melee,
                    underwater: self.underwater,
                },
                rng,
                effects,
            );
            dealt = settled.applied.effective;
            target_down = settled.target_down;
            report.damage = Some(damage);
            report.applied = Some(settled.applied);
            report.concentration = settled.concentration;
        }

        let Some(effect) = mastery_effect(weapon, attacker, target, hit, dealt, rules) else {
            return;
        };
        report.mastery = Some(effect);
        match effect {
            MasteryEffect::Graze { damage, damage_type } if !hit => {
                effects.note(format!("{} grazes {}", weapon.name, target.name));
                let settled = settle_damage(
                    state,
                    env,
                    DamageHit {
                        attacker: None,
                        target,
                        amount: damage,
                        damage_type,
                        melee: false,
                        underwater: self.underwater,
                    },
                    rng,
                    effects,
                );
                report.applied = Some(settled.applied);
                report.concentration = settled.concentration;
            }
            _ if target_down => {}
            MasteryEffect::Rider { kind, rounds } => {
                effects.push(Mutation::AddCondition(
                    ConditionInstance::new(target.id, kind, ConditionDuration::Rounds(rounds), weapon.name.clone())
                        .with_source(attacker.id),
                ));
                effects.note(format!("{} is {kind}", target.name));
            }
            MasteryEffect::Push { feet } => {
                push(state, env, attacker, target, rules.cells_for(feet), effects);
            }
            MasteryEffect::Topple { dc } => {
                let save = roll_saving_throw(
                    target,
                    Ability::Constitution,
                    dc,
                    exhaustion_penalty(state, env, target.id),
                    NaturalRule::TotalOnly,
                    rng,
                );
                report.mastery_save = Some(save);
                if !save.success {
                    effects.push(Mutation::AddCondition(
                        ConditionInstance::permanent(target.id, ConditionKind::Prone, weapon.name.clone())
                            .with_source(attacker.id),
                    ));
                    effects.note(format!("{} is toppled", target.name));
                }
            }
            MasteryEffect::Graze { .. } => {}
        }
    }

    fn log_roll(
        &self,
        attacker: &CombatEntity,
        target: &CombatEntity,
        weapon: &Weapon,
        roll: &AttackRoll,
        effects: &mut Effects,
    ) {
        let headline = format!("{} attacks {} with {}", attacker.name, target.name, weapon.name);
        let line = match roll.status {
            AttackStatus::CannotAct => format!("{headline}: {} cannot act", attacker.name),
            AttackStatus::Untargetable => format!("{headline}: target has total cover"),
            AttackStatus::OutOfRange => format!("{headline}: out of range"),
            AttackStatus::AutoMiss => format!("{headline}: automatic miss underwater"),
            AttackStatus::Rolled => {
                let verdict = match (roll.hit, roll.is_crit) {
                    (true, true) => "critical hit",
                    (true, false) => "hit",
                    (false, _) => "miss",
                };
                format!(
                    "{headline}: {} + {} = {} vs AC {}: {verdict}",
                    roll.natural,
                    roll.modifier,
                    roll.total,
                    roll.effective_ac.unwrap_or_default()
                )
            }
        };
        effects.note(line);
    }
}

fn push(
    state: &CombatState,
    env: &CombatEnv<'_>,
    attacker: &CombatEntity,
    target: &CombatEntity,
    cells: u32,
    effects: &mut Effects,
) {
    let path = push_path(&attacker.footprint(), &target.footprint(), cells);
    let destination = forced_destination(state, env, target, &path);
    if destination == target.position {
        effects.note(format!("{} does not budge", target.name));
        return;
    }
    relocate(state, target.id, destination, effects);
    effects.note(format!("{} is pushed to {destination}", target.name));
}
