//! The six ability scores and the save proficiencies keyed on them.

use bitflags::bitflags;

// ============================================================================
// Ability
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
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ability {
    #[strum(to_string = "Strength", serialize = "str")]
    Strength,
    #[strum(to_string = "Dexterity", serialize = "dex")]
    Dexterity,
    #[strum(to_string = "Constitution", serialize = "con")]
    Constitution,
    #[strum(to_string = "Intelligence", serialize = "int")]
    Intelligence,
    #[strum(to_string = "Wisdom", serialize = "wis")]
    Wisdom,
    #[strum(to_string = "Charisma", serialize = "cha")]
    Charisma,
}

impl Ability {
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
        }
    }

    pub const fn flag(self) -> AbilitySet {
        match self {
            Self::Strength => AbilitySet::STRENGTH,
            Self::Dexterity => AbilitySet::DEXTERITY,
            Self::Constitution => AbilitySet::CONSTITUTION,
            Self::Intelligence => AbilitySet::INTELLIGENCE,
            Self::Wisdom => AbilitySet::WISDOM,
            Self::Charisma => AbilitySet::CHARISMA,
        }
    }
}

bitflags! {
    /// Set of abilities, used for saving throw proficiencies.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AbilitySet: u8 {
        const STRENGTH = 1 << 0;
        const DEXTERITY = 1 << 1;
        const CONSTITUTION = 1 << 2;
        const INTELLIGENCE = 1 << 3;
        const WISDOM = 1 << 4;
        const CHARISMA = 1 << 5;
    }
}

impl AbilitySet {
    pub fn has(&self, ability: Ability) -> bool {
        self.contains(ability.flag())
    }
}

impl Default for AbilitySet {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub const fn new(
        strength: u8,
        dexterity: u8,
        constitution: u8,
        intelligence: u8,
        wisdom: u8,
        charisma: u8,
    ) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
        }
    }

    pub const fn score(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// `floor((score - 10) / 2)`.
    pub fn modifier(&self, ability: Ability) -> i32 {
        (i32::from(self.score(ability)) - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}
