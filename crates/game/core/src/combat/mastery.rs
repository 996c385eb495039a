//! Weapon mastery properties.
//!
//! A mastery only fires when the attacker has unlocked the weapon's tag.
//! This module decides *what* happens; the attack action turns it into
//! mutations (placing riders, moving the target, rolling the Topple save).

use super::attack::attack_ability;
use super::damage::DamageType;
use crate::config::RulesConfig;
use crate::state::{CombatEntity, ConditionKind, CreatureSize, MasteryKind, Weapon};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MasteryEffect {
    /// Damage dealt even though the attack missed.
    Graze { damage: u32, damage_type: DamageType },
    /// Short-lived condition on the target (Vexed, Sapped) or its speed (Slowed).
    Rider { kind: ConditionKind, rounds: u32 },
    Push { feet: u32 },
    /// Target makes a CON save against `dc` or falls Prone.
    Topple { dc: i32 },
}

/// The mastery the attacker can use with `weapon`, if any.
pub fn active_mastery(weapon: &Weapon, attacker: &CombatEntity) -> Option<MasteryKind> {
    weapon.mastery.filter(|kind| attacker.masteries.contains(kind))
}

/// Effect of `weapon`'s mastery for an attack that `hit` (or missed) and
/// dealt `damage_dealt` to the target's hit points.
pub fn mastery_effect(
    weapon: &Weapon,
    attacker: &CombatEntity,
    target: &CombatEntity,
    hit: bool,
    damage_dealt: u32,
    rules: &RulesConfig,
) -> Option<MasteryEffect> {
    let kind = active_mastery(weapon, attacker)?;
    let ability_modifier = attacker.ability_modifier(attack_ability(weapon, attacker));
    let rounds = rules.mastery_rider_rounds;

    match (kind, hit) {
        (MasteryKind::Graze, false) if ability_modifier > 0 => Some(MasteryEffect::Graze {
            damage: ability_modifier as u32,
            damage_type: weapon.damage_type,
        }),
        (MasteryKind::Vex, true) => Some(MasteryEffect::Rider {
            kind: ConditionKind::Vexed,
            rounds,
        }),
        (MasteryKind::Sap, true) => Some(MasteryEffect::Rider {
            kind: ConditionKind::Sapped,
            rounds,
        }),
        (MasteryKind::Slow, true) if damage_dealt > 0 => Some(MasteryEffect::Rider {
            kind: ConditionKind::Slowed,
            rounds,
        }),
        (MasteryKind::Push, true) if target.size <= CreatureSize::Large => Some(MasteryEffect::Push {
            feet: rules.push_mastery_feet,
        }),
        (MasteryKind::Topple, true) => Some(MasteryEffect::Topple {
            dc: 8 + ability_modifier + attacker.proficiency_bonus,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AbilityScores, EntityId, Faction, Position, WeaponKind};

    fn master(kind: MasteryKind) -> (CombatEntity, Weapon) {
        let weapon = Weapon::new("Blade", "1d8", DamageType::Slashing, WeaponKind::Melee).with_mastery(kind);
        let attacker = CombatEntity::new(EntityId(1), "Master", Faction::Player, Position::ORIGIN)
            .with_abilities(AbilityScores::new(16, 10, 10, 10, 10, 10))
            .with_proficiency_bonus(3)
            .with_mastery(kind);
        (attacker, weapon)
    }

    fn target() -> CombatEntity {
        CombatEntity::new(EntityId(2), "Target", Faction::Enemy, Position::new(1, 0))
    }

    #[test]
    fn locked_mastery_does_nothing() {
        let weapon = Weapon::new("Blade", "1d8", DamageType::Slashing, WeaponKind::Melee)
            .with_mastery(MasteryKind::Vex);
        let novice = CombatEntity::new(EntityId(1), "Novice", Faction::Player, Position::ORIGIN);
        let rules = RulesConfig::default();
        assert_eq!(mastery_effect(&weapon, &novice, &target(), true, 5, &rules), None);
    }

    #[test]
    fn graze_only_on_a_miss() {
        let (attacker, weapon) = master(MasteryKind::Graze);
        let rules = RulesConfig::default();
        assert_eq!(
            mastery_effect(&weapon, &attacker, &target(), false, 0, &rules),
            Some(MasteryEffect::Graze {
                damage: 3,
                damage_type: DamageType::Slashing
            })
        );
        assert_eq!(mastery_effect(&weapon, &attacker, &target(), true, 7, &rules), None);
    }

    #[test]
    fn slow_needs_damage() {
        let (attacker, weapon) = master(MasteryKind::Slow);
        let rules = RulesConfig::default();
        assert_eq!(mastery_effect(&weapon, &attacker, &target(), true, 0, &rules), None);
        assert!(matches!(
            mastery_effect(&weapon, &attacker, &target(), true, 4, &rules),
            Some(MasteryEffect::Rider {
                kind: ConditionKind::Slowed,
                ..
            })
        ));
    }

    #[test]
    fn push_skips_huge_targets() {
        let (attacker, weapon) = master(MasteryKind::Push);
        let rules = RulesConfig::default();
        let huge = target().with_size(CreatureSize::Huge);
        assert_eq!(mastery_effect(&weapon, &attacker, &huge, true, 5, &rules), None);
        assert_eq!(
            mastery_effect(&weapon, &attacker, &target(), true, 5, &rules),
            Some(MasteryEffect::Push { feet: 10 })
        );
    }

    #[test]
    fn topple_dc() {
        let (attacker, weapon) = master(MasteryKind::Topple);
        assert_eq!(
            mastery_effect(&weapon, &attacker, &target(), true, 5, &RulesConfig::default()),
            Some(MasteryEffect::Topple { dc: 14 })
        );
    }

    #[test]
    fn cleave_and_nick_have_no_rider() {
        for kind in [MasteryKind::Cleave, MasteryKind::Nick] {
            let (attacker, weapon) = master(kind);
            assert_eq!(
                mastery_effect(&weapon, &attacker, &target(), true, 5, &RulesConfig::default()),
                None
            );
        }
    }
}
