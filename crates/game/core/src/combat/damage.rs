//! Damage typing and application to hit points.

use crate::state::{CombatEntity, HitPoints, TypeModifiers};

// ============================================================================
// Damage Type
// ============================================================================

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageType {
    Acid,
    Bludgeoning,
    Cold,
    Fire,
    Force,
    Lightning,
    Necrotic,
    Piercing,
    Poison,
    Psychic,
    Radiant,
    Slashing,
    Thunder,
}

// ============================================================================
// Damage Application
// ============================================================================

/// Everything that happened when damage met a token's hit points.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageApplicationResult {
    pub damage_type: DamageType,
    pub incoming: u32,
    pub absorbed_by_temporary: u32,
    /// Damage that reached hit points.
    pub effective: u32,
    /// Human-readable note on what changed the number, empty when nothing did.
    pub modifier_description: String,
    pub hit_points: u32,
    pub temporary_hit_points: u32,
    /// Hit points dropped to 0 from a melee attack: knockout is possible.
    pub reduced_to_zero: bool,
    /// Damage left after reaching 0 was at least the hit point maximum.
    pub instant_death: bool,
}

impl DamageApplicationResult {
    pub fn dropped_to_zero(&self) -> bool {
        self.hit_points == 0 && self.effective > 0
    }
}

/// Resistances, vulnerabilities and immunities of `target` against
/// `damage_type`. Fighting underwater grants fire resistance.
pub fn type_modifiers(target: &CombatEntity, damage_type: DamageType, underwater: bool) -> TypeModifiers {
    let mut modifiers = target.damage_profile.modifiers_for(damage_type);
    if underwater && damage_type == DamageType::Fire {
        modifiers.resistant = true;
    }
    modifiers
}

/// Applies `amount` damage of one type.
///
/// Temporary hit points soak damage first. What gets through is halved
/// (rounded down) for resistance, then doubled for vulnerability, then
/// zeroed for immunity.
pub fn apply_damage(
    hit_points: &HitPoints,
    modifiers: TypeModifiers,
    amount: u32,
    damage_type: DamageType,
    melee: bool,
) -> DamageApplicationResult {
    let absorbed = amount.min(hit_points.temporary);
    let mut effective = amount - absorbed;
    let mut notes = Vec::new();

    if absorbed > 0 {
        notes.push(format!("{absorbed} absorbed by temporary hit points"));
    }
    if modifiers.resistant {
        effective /= 2;
        notes.push(format!("resistant to {damage_type}"));
    }
    if modifiers.vulnerable {
        effective = effective.saturating_mul(2);
        notes.push(format!("vulnerable to {damage_type}"));
    }
    if modifiers.immune {
        effective = 0;
        notes.push(format!("immune to {damage_type}"));
    }

    let current = hit_points.current;
    let remaining = current.saturating_sub(effective);
    let overflow = effective.saturating_sub(current);
    let dropped = effective > 0 && remaining == 0;
    let instant_death = dropped && hit_points.max > 0 && overflow >= hit_points.max;

    DamageApplicationResult {
        damage_type,
        incoming: amount,
        absorbed_by_temporary: absorbed,
        effective,
        modifier_description: notes.join(", "),
        hit_points: remaining,
        temporary_hit_points: hit_points.temporary - absorbed,
        reduced_to_zero: dropped && current > 0 && melee,
        instant_death,
    }
}
