//! Unarmed strike modes and forced movement.

use super::save::{NaturalRule, SavingThrow, best_physical_save, roll_saving_throw};
use crate::env::RandomSource;
use crate::state::{Ability, CombatEntity, Footprint, Position};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnarmedMode {
    #[default]
    Damage,
    Grapple,
    Shove,
}

/// What a successful shove does, picked before the save is rolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShoveChoice {
    #[default]
    Push,
    Prone,
}

/// DC the target saves against when grappled or shoved.
pub fn contest_dc(attacker: &CombatEntity) -> i32 {
    8 + attacker.proficiency_bonus + attacker.ability_modifier(Ability::Strength)
}

/// Targets more than one size category larger cannot be grappled or shoved.
pub fn can_contest(attacker: &CombatEntity, target: &CombatEntity) -> bool {
    target.size.category() <= attacker.size.category() + 1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContestOutcome {
    TargetTooLarge,
    Resolved(SavingThrow),
}

impl ContestOutcome {
    /// The target failed its save.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Resolved(save) if !save.success)
    }
}

/// Target saves with its better physical save; naturals decide.
pub fn resolve_contest(
    attacker: &CombatEntity,
    target: &CombatEntity,
    target_penalty: i32,
    rng: &mut dyn RandomSource,
) -> ContestOutcome {
    if !can_contest(attacker, target) {
        return ContestOutcome::TargetTooLarge;
    }
    let ability = best_physical_save(target);
    ContestOutcome::Resolved(roll_saving_throw(
        target,
        ability,
        contest_dc(attacker),
        target_penalty,
        NaturalRule::NaturalDecides,
        rng,
    ))
}

/// Unit step pointing from `from`'s centre toward `to`'s centre.
pub fn away_step(from: &Footprint, to: &Footprint) -> (i32, i32) {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    let sign = |delta: f64| {
        if delta > f64::EPSILON {
            1
        } else if delta < -f64::EPSILON {
            -1
        } else {
            0
        }
    };
    (sign(tx - fx), sign(ty - fy))
}

/// Cells the target passes through when pushed `cells` directly away from
/// the attacker, nearest first. Empty when the two share a centre.
pub fn push_path(attacker: &Footprint, target: &Footprint, cells: u32) -> Vec<Position> {
    let (dx, dy) = away_step(attacker, target);
    if dx == 0 && dy == 0 {
        return Vec::new();
    }
    (1..=cells as i32)
        .map(|step| target.origin.offset(dx * step, dy * step))
        .collect()
}
