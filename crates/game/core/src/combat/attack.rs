//! Attack and damage roll math.
//!
//! Pure functions over an [`AttackContext`]. The action layer builds the
//! context (cover, reach, resolver output) from the store and turns the
//! results into mutations.
//!
//! # Pipeline
//!
//! ```text
//! cannot act?        -> no roll
//! total cover?       -> untargetable, no roll
//! beyond long range? -> out of range
//! underwater ranged beyond normal range -> automatic miss
//! roll d20 (one, or two for advantage/disadvantage)
//! natural 1 misses; natural >= crit threshold crits; else total vs AC
//! ```

use arrayvec::ArrayVec;

use super::advantage::{RangeClass, RollMode, RollModifiers, RollSource};
use super::dice::DiceExpr;
use crate::config::RulesConfig;
use crate::env::RandomSource;
use crate::geometry::CoverCategory;
use crate::state::{Ability, CombatEntity, CombatFeatures, Weapon, WeaponProperties};

// ============================================================================
// Inputs
// ============================================================================

/// Extra damage dice from a spell or feature (Divine Smite, Sneak Attack).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusDice {
    pub label: String,
    pub dice: String,
    pub doubles_on_crit: bool,
}

impl BonusDice {
    pub fn new(label: impl Into<String>, dice: impl Into<String>, doubles_on_crit: bool) -> Self {
        Self {
            label: label.into(),
            dice: dice.into(),
            doubles_on_crit,
        }
    }
}

/// Choices the attacker makes before rolling.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AttackOptions {
    pub offhand: bool,
    pub thrown: bool,
    pub power_attack: bool,
    /// The hand not holding the weapon holds something (blocks Dueling).
    pub other_hand_occupied: bool,
    pub attack_bonus: i32,
    pub damage_bonus: i32,
    pub bonus_dice: Vec<BonusDice>,
    /// Overrides the rule table and feature thresholds.
    pub crit_threshold: Option<u32>,
    pub overrides: super::advantage::RollOverrides,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Situation {
    pub underwater: bool,
    /// Gap between the two footprints, in feet.
    pub distance_feet: u32,
    pub within_reach: bool,
    pub hostile_in_reach: bool,
}

pub struct AttackContext<'a> {
    pub attacker: &'a CombatEntity,
    pub target: &'a CombatEntity,
    pub weapon: &'a Weapon,
    pub cover: CoverCategory,
    pub options: &'a AttackOptions,
    pub situation: Situation,
    /// Resolver output before caller overrides.
    pub modifiers: RollModifiers,
}

impl AttackContext<'_> {
    pub fn range_class(&self) -> RangeClass {
        range_class(self.weapon, self.options)
    }
}

pub fn range_class(weapon: &Weapon, options: &AttackOptions) -> RangeClass {
    if weapon.is_ranged() || options.thrown {
        RangeClass::Ranged
    } else {
        RangeClass::Melee
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeBand {
    Normal,
    Long,
    OutOfRange,
}

/// Where `distance_feet` falls for a ranged or thrown attack. Weapons
/// without a listed range never leave normal range.
pub fn range_band(weapon: &Weapon, distance_feet: u32) -> RangeBand {
    match weapon.range {
        Some(range) if distance_feet > range.long => RangeBand::OutOfRange,
        Some(range) if distance_feet > range.normal => RangeBand::Long,
        _ => RangeBand::Normal,
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Ability used for attack and damage rolls with `weapon`.
pub fn attack_ability(weapon: &Weapon, attacker: &CombatEntity) -> Ability {
    if weapon.is_unarmed() {
        return Ability::Strength;
    }
    if weapon.has(WeaponProperties::FINESSE) {
        let strength = attacker.ability_modifier(Ability::Strength);
        let dexterity = attacker.ability_modifier(Ability::Dexterity);
        return if dexterity > strength {
            Ability::Dexterity
        } else {
            Ability::Strength
        };
    }
    if weapon.is_ranged() {
        Ability::Dexterity
    } else {
        Ability::Strength
    }
}

fn power_attack_applies(weapon: &Weapon, attacker: &CombatEntity, options: &AttackOptions) -> bool {
    if !options.power_attack {
        return false;
    }
    let heavy_melee = !weapon.is_ranged() && weapon.has(WeaponProperties::HEAVY);
    (heavy_melee && attacker.features.contains(CombatFeatures::GREAT_WEAPON_MASTER))
        || (weapon.is_ranged() && attacker.features.contains(CombatFeatures::SHARPSHOOTER))
}

pub fn compute_attack_modifier(
    weapon: &Weapon,
    attacker: &CombatEntity,
    options: &AttackOptions,
    rules: &RulesConfig,
) -> i32 {
    let mut modifier = attacker.ability_modifier(attack_ability(weapon, attacker));
    if weapon.is_unarmed() || (weapon.proficient && !weapon.is_improvised()) {
        modifier += attacker.proficiency_bonus;
    }
    if weapon.is_ranged() && attacker.features.contains(CombatFeatures::ARCHERY) {
        modifier += rules.archery_bonus;
    }
    if power_attack_applies(weapon, attacker, options) {
        modifier += rules.power_attack_penalty;
    }
    modifier + options.attack_bonus
}

pub fn compute_damage_modifier(
    weapon: &Weapon,
    attacker: &CombatEntity,
    options: &AttackOptions,
    rules: &RulesConfig,
) -> i32 {
    let ability = attacker.ability_modifier(attack_ability(weapon, attacker));
    let mut modifier = if options.offhand
        && ability > 0
        && !attacker.features.contains(CombatFeatures::TWO_WEAPON_FIGHTING)
    {
        0
    } else {
        ability
    };

    let one_handed_melee = !weapon.is_ranged()
        && !options.thrown
        && !weapon.is_unarmed()
        && !weapon.has(WeaponProperties::TWO_HANDED);
    if one_handed_melee
        && !options.offhand
        && !options.other_hand_occupied
        && attacker.features.contains(CombatFeatures::DUELING)
    {
        modifier += rules.dueling_bonus;
    }
    if options.thrown
        && weapon.has(WeaponProperties::THROWN)
        && attacker.features.contains(CombatFeatures::THROWN_WEAPON_FIGHTING)
    {
        modifier += rules.thrown_weapon_bonus;
    }
    if power_attack_applies(weapon, attacker, options) {
        modifier += rules.power_attack_bonus;
    }
    modifier + options.damage_bonus
}

/// Target AC after cover, or `None` when total cover makes it untargetable.
/// Sharpshooter ignores partial cover on ranged weapon attacks.
pub fn effective_ac(
    target: &CombatEntity,
    cover: CoverCategory,
    weapon: &Weapon,
    attacker: &CombatEntity,
    rules: &RulesConfig,
) -> Option<i32> {
    let bonus = cover.ac_bonus(rules)?;
    if weapon.is_ranged() && attacker.features.contains(CombatFeatures::SHARPSHOOTER) {
        return Some(target.armor_class);
    }
    Some(target.armor_class + bonus)
}

// ============================================================================
// Attack Roll
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackStatus {
    Rolled,
    /// Attacker is incapacitated.
    CannotAct,
    /// Target has total cover.
    Untargetable,
    OutOfRange,
    /// Underwater ranged attack beyond normal range.
    AutoMiss,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackRoll {
    pub status: AttackStatus,
    pub mode: RollMode,
    pub d20: ArrayVec<u32, 2>,
    pub natural: u32,
    pub modifier: i32,
    pub total: i32,
    pub effective_ac: Option<i32>,
    pub is_crit: bool,
    pub is_fumble: bool,
    pub hit: bool,
    /// Sources left after caller overrides.
    pub advantage: Vec<RollSource>,
    pub disadvantage: Vec<RollSource>,
}

impl AttackRoll {
    fn unrolled(status: AttackStatus, effective_ac: Option<i32>, modifiers: &RollModifiers) -> Self {
        Self {
            status,
            mode: RollMode::Normal,
            d20: ArrayVec::new(),
            natural: 0,
            modifier: 0,
            total: 0,
            effective_ac,
            is_crit: false,
            is_fumble: false,
            hit: false,
            advantage: modifiers.advantage.clone(),
            disadvantage: modifiers.disadvantage.clone(),
        }
    }
}

/// Lowest natural roll that crits for this attacker.
pub fn crit_threshold(attacker: &CombatEntity, options: &AttackOptions, rules: &RulesConfig) -> u32 {
    let from_features = if attacker.features.contains(CombatFeatures::IMPROVED_CRITICAL) {
        rules.crit_threshold.min(19)
    } else {
        rules.crit_threshold
    };
    options.crit_threshold.unwrap_or(from_features).clamp(2, 20)
}

pub fn roll_attack(ctx: &AttackContext<'_>, rules: &RulesConfig, rng: &mut dyn RandomSource) -> AttackRoll {
    let modifiers = ctx.modifiers.filtered(&ctx.options.overrides);
    let effective_ac = effective_ac(ctx.target, ctx.cover, ctx.weapon, ctx.attacker, rules);

    if modifiers.attacker_cannot_act {
        return AttackRoll::unrolled(AttackStatus::CannotAct, effective_ac, &modifiers);
    }
    let Some(ac) = effective_ac else {
        return AttackRoll::unrolled(AttackStatus::Untargetable, None, &modifiers);
    };
    let band = match ctx.range_class() {
        RangeClass::Melee if !ctx.situation.within_reach => RangeBand::OutOfRange,
        RangeClass::Melee => RangeBand::Normal,
        RangeClass::Ranged => range_band(ctx.weapon, ctx.situation.distance_feet),
    };
    match band {
        RangeBand::OutOfRange => {
            return AttackRoll::unrolled(AttackStatus::OutOfRange, effective_ac, &modifiers);
        }
        RangeBand::Long if ctx.situation.underwater => {
            return AttackRoll::unrolled(AttackStatus::AutoMiss, effective_ac, &modifiers);
        }
        _ => {}
    }

    let mode = modifiers.mode();
    let mut d20 = ArrayVec::<u32, 2>::new();
    d20.push(rng.roll_d20());
    if mode != RollMode::Normal {
        d20.push(rng.roll_d20());
    }
    let natural = match mode {
        RollMode::Advantage => d20.iter().copied().max().unwrap_or(1),
        RollMode::Disadvantage => d20.iter().copied().min().unwrap_or(1),
        RollMode::Normal => d20[0],
    };

    let modifier = compute_attack_modifier(ctx.weapon, ctx.attacker, ctx.options, rules)
        - modifiers.exhaustion_penalty;
    let total = natural as i32 + modifier;
    let is_fumble = natural == 1;
    let natural_crit = !is_fumble && natural >= crit_threshold(ctx.attacker, ctx.options, rules);
    let hit = !is_fumble && (natural_crit || total >= ac);
    let is_crit = hit && (natural_crit || modifiers.auto_crit);

    AttackRoll {
        status: AttackStatus::Rolled,
        mode,
        d20,
        natural,
        modifier,
        total,
        effective_ac,
        is_crit,
        is_fumble,
        hit,
        advantage: modifiers.advantage,
        disadvantage: modifiers.disadvantage,
    }
}

// ============================================================================
// Damage Roll
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRoll {
    /// Expression actually rolled, after crit doubling.
    pub expression: String,
    pub rolls: Vec<u32>,
    pub bonus_rolls: Vec<u32>,
    /// Flat part of the weapon expression plus the damage modifier.
    pub modifier: i32,
    pub critical: bool,
    pub total: u32,
}

pub fn roll_damage(
    ctx: &AttackContext<'_>,
    is_crit: bool,
    rules: &RulesConfig,
    rng: &mut dyn RandomSource,
) -> DamageRoll {
    let damage_modifier = compute_damage_modifier(ctx.weapon, ctx.attacker, ctx.options, rules);

    let weapon_dice = if ctx.weapon.is_unarmed() {
        DiceExpr::flat(1)
    } else {
        let base = DiceExpr::parse_or_zero(&ctx.weapon.damage);
        if is_crit { base.doubled() } else { base }
    };
    let weapon_roll = weapon_dice.roll(rng);

    let mut bonus_rolls = Vec::new();
    let mut bonus_total = 0i64;
    for bonus in &ctx.options.bonus_dice {
        let base = DiceExpr::parse_or_zero(&bonus.dice);
        let dice = if is_crit && bonus.doubles_on_crit {
            base.doubled()
        } else {
            base
        };
        let roll = dice.roll(rng);
        bonus_total += i64::from(roll.total);
        bonus_rolls.extend(roll.rolls);
    }

    let modifier = weapon_dice.modifier + damage_modifier;
    let raw = i64::from(weapon_roll.total) + i64::from(damage_modifier) + bonus_total;
    let floor = if ctx.weapon.is_unarmed() { 1 } else { 0 };
    let total = raw.clamp(floor, i64::from(u32::MAX)) as u32;

    DamageRoll {
        expression: weapon_dice.to_string(),
        rolls: weapon_roll.rolls,
        bonus_rolls,
        modifier,
        critical: is_crit,
        total,
    }
}
