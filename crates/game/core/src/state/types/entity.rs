//! Combatant tokens and the per-creature numbers the rules read.

use std::collections::BTreeSet;

use bitflags::bitflags;

use super::abilities::{Ability, AbilityScores, AbilitySet};
use super::common::{EntityId, Footprint, Position};
use super::weapon::{MasteryKind, Weapon};
use crate::combat::DamageType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    Player,
    Npc,
    #[default]
    Enemy,
}

impl Faction {
    /// Players and allied NPCs stand together against enemies.
    pub fn is_hostile_to(self, other: Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Enemy, Faction::Player | Faction::Npc)
                | (Faction::Player | Faction::Npc, Faction::Enemy)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreatureSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl CreatureSize {
    /// Side length of the occupied square, in cells.
    pub const fn footprint(self) -> u32 {
        match self {
            Self::Tiny | Self::Small | Self::Medium => 1,
            Self::Large => 2,
            Self::Huge => 3,
            Self::Gargantuan => 4,
        }
    }

    pub const fn category(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitPoints {
    pub current: u32,
    pub max: u32,
    pub temporary: u32,
}

impl HitPoints {
    pub const fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
            temporary: 0,
        }
    }

    pub const fn with_temporary(mut self, temporary: u32) -> Self {
        self.temporary = temporary;
        self
    }

    pub const fn is_down(&self) -> bool {
        self.current == 0
    }
}

/// Speeds in feet per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Speeds {
    pub walk: u32,
    pub swim: u32,
    pub climb: u32,
    pub fly: u32,
}

impl Speeds {
    pub const fn walking(walk: u32) -> Self {
        Self {
            walk,
            swim: 0,
            climb: 0,
            fly: 0,
        }
    }
}

impl Default for Speeds {
    fn default() -> Self {
        Self::walking(30)
    }
}

/// How a damage type is treated before it reaches hit points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TypeModifiers {
    pub resistant: bool,
    pub vulnerable: bool,
    pub immune: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageProfile {
    pub resistances: BTreeSet<DamageType>,
    pub vulnerabilities: BTreeSet<DamageType>,
    pub immunities: BTreeSet<DamageType>,
}

impl DamageProfile {
    pub fn modifiers_for(&self, damage_type: DamageType) -> TypeModifiers {
        TypeModifiers {
            resistant: self.resistances.contains(&damage_type),
            vulnerable: self.vulnerabilities.contains(&damage_type),
            immune: self.immunities.contains(&damage_type),
        }
    }
}

bitflags! {
    /// Fighting styles and feats that change attack math.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct CombatFeatures: u16 {
        const ARCHERY = 1 << 0;
        const DUELING = 1 << 1;
        const THROWN_WEAPON_FIGHTING = 1 << 2;
        const TWO_WEAPON_FIGHTING = 1 << 3;
        const GREAT_WEAPON_MASTER = 1 << 4;
        const SHARPSHOOTER = 1 << 5;
        /// Critical hit on 19-20.
        const IMPROVED_CRITICAL = 1 << 6;
    }
}

impl Default for CombatFeatures {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// CombatEntity
// ============================================================================

/// A token on the battle map.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatEntity {
    pub id: EntityId,
    pub name: String,
    pub faction: Faction,
    /// Top-left cell of the footprint.
    pub position: Position,
    pub size: CreatureSize,
    pub armor_class: i32,
    pub hit_points: HitPoints,
    pub damage_profile: DamageProfile,
    pub speeds: Speeds,
    pub abilities: AbilityScores,
    pub proficiency_bonus: i32,
    pub save_proficiencies: AbilitySet,
    pub features: CombatFeatures,
    pub masteries: BTreeSet<MasteryKind>,
    pub weapons: Vec<Weapon>,
    pub mounted_on: Option<EntityId>,
    pub rider: Option<EntityId>,
    pub slain: bool,
}

impl CombatEntity {
    pub fn new(id: EntityId, name: impl Into<String>, faction: Faction, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            position,
            size: CreatureSize::Medium,
            armor_class: 10,
            hit_points: HitPoints::new(10),
            damage_profile: DamageProfile::default(),
            speeds: Speeds::default(),
            abilities: AbilityScores::default(),
            proficiency_bonus: 2,
            save_proficiencies: AbilitySet::empty(),
            features: CombatFeatures::empty(),
            masteries: BTreeSet::new(),
            weapons: Vec::new(),
            mounted_on: None,
            rider: None,
            slain: false,
        }
    }

    pub fn with_size(mut self, size: CreatureSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_hit_points(mut self, hit_points: HitPoints) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_proficiency_bonus(mut self, bonus: i32) -> Self {
        self.proficiency_bonus = bonus;
        self
    }

    pub fn with_save_proficiencies(mut self, saves: AbilitySet) -> Self {
        self.save_proficiencies = saves;
        self
    }

    pub fn with_features(mut self, features: CombatFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_speeds(mut self, speeds: Speeds) -> Self {
        self.speeds = speeds;
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_mastery(mut self, mastery: MasteryKind) -> Self {
        self.masteries.insert(mastery);
        self
    }

    pub fn with_resistance(mut self, damage_type: DamageType) -> Self {
        self.damage_profile.resistances.insert(damage_type);
        self
    }

    pub fn with_vulnerability(mut self, damage_type: DamageType) -> Self {
        self.damage_profile.vulnerabilities.insert(damage_type);
        self
    }

    pub fn with_immunity(mut self, damage_type: DamageType) -> Self {
        self.damage_profile.immunities.insert(damage_type);
        self
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.size.footprint())
    }

    /// Looks up a carried weapon by name, ignoring case.
    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons
            .iter()
            .find(|weapon| weapon.name.eq_ignore_ascii_case(name))
    }

    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    pub fn saving_throw_bonus(&self, ability: Ability) -> i32 {
        let proficiency = if self.save_proficiencies.has(ability) {
            self.proficiency_bonus
        } else {
            0
        };
        self.ability_modifier(ability) + proficiency
    }

    /// Longest melee reach among carried weapons, in feet. Unarmed reach is
    /// the floor.
    pub fn melee_reach_feet(&self) -> u32 {
        self.weapons
            .iter()
            .filter(|weapon| !weapon.is_ranged())
            .map(Weapon::reach_feet)
            .max()
            .unwrap_or(5)
            .max(5)
    }

    pub fn is_hostile_to(&self, other: &CombatEntity) -> bool {
        self.faction.is_hostile_to(other.faction)
    }
}
