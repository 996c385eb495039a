//! Encounter roster loader.
//!
//! A roster lists every token in an encounter with its stat block. Weapons
//! are referenced by catalog name so stat blocks stay short.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tabletop_core::state::{Ability, AbilityScores, AbilitySet, CombatFeatures, MasteryKind, Speeds};
use tabletop_core::{CombatEntity, CreatureSize, DamageType, EntityId, Faction, HitPoints, Position};

use crate::loaders::weapons::WeaponCatalog;
use crate::loaders::{LoadResult, flag_name, read_file};

/// One token as written in RON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub id: u32,
    pub name: String,
    pub faction: Faction,
    pub position: (i32, i32),
    #[serde(default)]
    pub size: CreatureSize,
    #[serde(default = "default_armor_class")]
    pub armor_class: i32,
    pub hit_points: u32,
    #[serde(default)]
    pub temporary_hit_points: u32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default = "default_proficiency_bonus")]
    pub proficiency_bonus: i32,
    #[serde(default)]
    pub speeds: Speeds,
    #[serde(default)]
    pub saves: Vec<Ability>,
    /// Fighting styles and feats by name, e.g. `"great-weapon-master"`.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub masteries: Vec<MasteryKind>,
    /// Catalog weapon names.
    #[serde(default)]
    pub weapons: Vec<String>,
    #[serde(default)]
    pub resistances: Vec<DamageType>,
    #[serde(default)]
    pub vulnerabilities: Vec<DamageType>,
    #[serde(default)]
    pub immunities: Vec<DamageType>,
}

fn default_armor_class() -> i32 {
    10
}

fn default_proficiency_bonus() -> i32 {
    2
}

impl CombatantSpec {
    pub fn build(&self, catalog: &WeaponCatalog) -> LoadResult<CombatEntity> {
        anyhow::ensure!(self.hit_points > 0, "{} has no hit points", self.name);

        let mut saves = AbilitySet::empty();
        for ability in &self.saves {
            saves |= ability.flag();
        }

        let mut features = CombatFeatures::empty();
        for name in &self.features {
            let flag = CombatFeatures::from_name(&flag_name(name))
                .ok_or_else(|| anyhow::anyhow!("Unknown feature '{}' on {}", name, self.name))?;
            features |= flag;
        }

        let (x, y) = self.position;
        let mut entity = CombatEntity::new(EntityId(self.id), self.name.clone(), self.faction, Position::new(x, y))
            .with_size(self.size)
            .with_armor_class(self.armor_class)
            .with_hit_points(HitPoints::new(self.hit_points).with_temporary(self.temporary_hit_points))
            .with_abilities(self.abilities)
            .with_proficiency_bonus(self.proficiency_bonus)
            .with_speeds(self.speeds)
            .with_save_proficiencies(saves)
            .with_features(features);

        for mastery in &self.masteries {
            entity = entity.with_mastery(*mastery);
        }
        for name in &self.weapons {
            let weapon = catalog
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("{} carries unknown weapon '{}'", self.name, name))?;
            entity = entity.with_weapon(weapon.clone());
        }
        for damage_type in &self.resistances {
            entity = entity.with_resistance(*damage_type);
        }
        for damage_type in &self.vulnerabilities {
            entity = entity.with_vulnerability(*damage_type);
        }
        for damage_type in &self.immunities {
            entity = entity.with_immunity(*damage_type);
        }
        Ok(entity)
    }
}


/// Loader for encounter rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    pub fn load(path: &Path, catalog: &WeaponCatalog) -> LoadResult<Vec<CombatEntity>> {
        let content = read_file(path)?;
        Self::parse(&content, catalog)
    }

    pub fn parse(content: &str, catalog: &WeaponCatalog) -> LoadResult<Vec<CombatEntity>> {
        let specs: Vec<CombatantSpec> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        let mut seen = BTreeSet::new();
        let mut entities = Vec::with_capacity(specs.len());
        for spec in &specs {
            anyhow::ensure!(seen.insert(spec.id), "Duplicate entity id {} ({})", spec.id, spec.name);
            entities.push(spec.build(catalog)?);
        }
        Ok(entities)
    }
}
