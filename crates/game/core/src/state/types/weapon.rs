//! Weapons carried by combatants, plus the two synthetic weapons every
//! creature can fall back to.

use bitflags::bitflags;

use crate::combat::DamageType;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct WeaponProperties: u16 {
        const FINESSE = 1 << 0;
        const LIGHT = 1 << 1;
        const HEAVY = 1 << 2;
        const THROWN = 1 << 3;
        const TWO_HANDED = 1 << 4;
        const VERSATILE = 1 << 5;
        const REACH = 1 << 6;
        const AMMUNITION = 1 << 7;
        const LOADING = 1 << 8;
    }
}

impl Default for WeaponProperties {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponKind {
    #[default]
    Melee,
    Ranged,
}

/// Distinguishes catalog weapons from the synthetic fallbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeaponForm {
    #[default]
    Armed,
    Unarmed,
    Improvised,
}

/// Weapon mastery tags. A tag only takes effect when the wielder has
/// unlocked it.
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
    strum::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MasteryKind {
    /// Extra attack economy; resolved by the host, no rider here.
    Cleave,
    Graze,
    /// Extra attack economy; resolved by the host, no rider here.
    Nick,
    Push,
    Sap,
    Slow,
    Topple,
    Vex,
}

/// Normal and long range in feet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponRange {
    pub normal: u32,
    pub long: u32,
}

impl WeaponRange {
    pub const fn new(normal: u32, long: u32) -> Self {
        Self { normal, long }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub name: String,
    /// Dice expression such as `1d8` or `2d6+1`.
    pub damage: String,
    pub damage_type: DamageType,
    pub kind: WeaponKind,
    pub properties: WeaponProperties,
    pub range: Option<WeaponRange>,
    pub proficient: bool,
    pub mastery: Option<MasteryKind>,
    pub form: WeaponForm,
}

impl Weapon {
    pub fn new(
        name: impl Into<String>,
        damage: impl Into<String>,
        damage_type: DamageType,
        kind: WeaponKind,
    ) -> Self {
        Self {
            name: name.into(),
            damage: damage.into(),
            damage_type,
            kind,
            properties: WeaponProperties::empty(),
            range: None,
            proficient: true,
            mastery: None,
            form: WeaponForm::Armed,
        }
    }

    /// Fists, kicks, headbutts. Flat damage, no dice.
    pub fn unarmed_strike() -> Self {
        Self {
            form: WeaponForm::Unarmed,
            ..Self::new("Unarmed Strike", "1", DamageType::Bludgeoning, WeaponKind::Melee)
        }
    }

    /// A chair leg or a bottle. Never proficient.
    pub fn improvised() -> Self {
        Self {
            proficient: false,
            range: Some(WeaponRange::new(20, 60)),
            form: WeaponForm::Improvised,
            ..Self::new("Improvised Weapon", "1d4", DamageType::Bludgeoning, WeaponKind::Melee)
        }
    }

    pub fn with_properties(mut self, properties: WeaponProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_range(mut self, normal: u32, long: u32) -> Self {
        self.range = Some(WeaponRange::new(normal, long));
        self
    }

    pub fn with_mastery(mut self, mastery: MasteryKind) -> Self {
        self.mastery = Some(mastery);
        self
    }

    pub fn with_proficiency(mut self, proficient: bool) -> Self {
        self.proficient = proficient;
        self
    }

    pub fn has(&self, property: WeaponProperties) -> bool {
        self.properties.contains(property)
    }

    pub fn is_ranged(&self) -> bool {
        self.kind == WeaponKind::Ranged
    }

    pub fn is_unarmed(&self) -> bool {
        self.form == WeaponForm::Unarmed
    }

    pub fn is_improvised(&self) -> bool {
        self.form == WeaponForm::Improvised
    }

    /// Melee reach in feet.
    pub fn reach_feet(&self) -> u32 {
        if self.has(WeaponProperties::REACH) { 10 } else { 5 }
    }
}
