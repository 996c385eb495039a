//! Saving throws.

use crate::env::RandomSource;
use crate::state::{Ability, CombatEntity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SavingThrow {
    pub ability: Ability,
    pub natural: u32,
    pub bonus: i32,
    pub total: i32,
    pub dc: i32,
    pub success: bool,
}

/// Whether natural 20s and 1s decide the save regardless of the total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NaturalRule {
    TotalOnly,
    NaturalDecides,
}

/// Rolls `entity`'s save with `ability` against `dc`, applying `penalty`
/// (e.g. exhaustion) to the total.
pub fn roll_saving_throw(
    entity: &CombatEntity,
    ability: Ability,
    dc: i32,
    penalty: i32,
    natural_rule: NaturalRule,
    rng: &mut dyn RandomSource,
) -> SavingThrow {
    let natural = rng.roll_d20();
    let bonus = entity.saving_throw_bonus(ability);
    let total = natural as i32 + bonus - penalty;
    let success = match (natural_rule, natural) {
        (NaturalRule::NaturalDecides, 20) => true,
        (NaturalRule::NaturalDecides, 1) => false,
        _ => total >= dc,
    };
    SavingThrow {
        ability,
        natural,
        bonus,
        total,
        dc,
        success,
    }
}

/// The better of STR and DEX saves for `entity`; STR on a tie.
pub fn best_physical_save(entity: &CombatEntity) -> Ability {
    if entity.saving_throw_bonus(Ability::Dexterity) > entity.saving_throw_bonus(Ability::Strength) {
        Ability::Dexterity
    } else {
        Ability::Strength
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SequenceRng;
    use crate::state::{AbilityScores, AbilitySet, EntityId, Faction, Position};

    fn rogue() -> CombatEntity {
        CombatEntity::new(EntityId(4), "Rogue", Faction::Player, Position::ORIGIN)
            .with_abilities(AbilityScores::new(8, 18, 12, 10, 10, 10))
            .with_save_proficiencies(AbilitySet::DEXTERITY)
    }

    #[test]
    fn total_against_dc() {
        let mut rng = SequenceRng::new([9]);
        let save = roll_saving_throw(&rogue(), Ability::Dexterity, 15, 0, NaturalRule::TotalOnly, &mut rng);
        assert_eq!(save.bonus, 6);
        assert_eq!(save.total, 15);
        assert!(save.success);
    }

    #[test]
    fn naturals_decide_contests() {
        let mut rng = SequenceRng::new([20, 1]);
        let hopeless =
            roll_saving_throw(&rogue(), Ability::Strength, 30, 0, NaturalRule::NaturalDecides, &mut rng);
        assert!(hopeless.success);
        let trivial =
            roll_saving_throw(&rogue(), Ability::Dexterity, 2, 0, NaturalRule::NaturalDecides, &mut rng);
        assert!(!trivial.success);
    }

    #[test]
    fn picks_the_better_physical_save() {
        assert_eq!(best_physical_save(&rogue()), Ability::Dexterity);
        let plain = CombatEntity::new(EntityId(5), "Commoner", Faction::Npc, Position::ORIGIN);
        assert_eq!(best_physical_save(&plain), Ability::Strength);
    }
}
