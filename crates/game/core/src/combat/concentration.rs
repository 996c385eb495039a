use super::save::{NaturalRule, SavingThrow, roll_saving_throw};
use crate::config::RulesConfig;
use crate::env::RandomSource;
use crate::state::{Ability, CombatEntity};

/// DC to keep concentrating after taking `damage`.
pub fn concentration_dc(damage: u32, rules: &RulesConfig) -> i32 {
    let half = i32::try_from(damage / 2).unwrap_or(i32::MAX);
    half.max(rules.concentration_min_dc)
}

pub fn concentration_check(
    entity: &CombatEntity,
    damage: u32,
    penalty: i32,
    rules: &RulesConfig,
    rng: &mut dyn RandomSource,
) -> SavingThrow {
    roll_saving_throw(
        entity,
        Ability::Constitution,
        concentration_dc(damage, rules),
        penalty,
        NaturalRule::TotalOnly,
        rng,
    )
}
