//! Content factory for building encounters from data files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tabletop_core::{CombatState, MapSnapshot, Position, RulesConfig};

use crate::loaders::{LoadResult, MapLoader, RosterLoader, RulesLoader, WeaponCatalog, WeaponLoader};

/// Everything a session needs to start a fight.
#[derive(Debug, Clone)]
pub struct Encounter {
    pub rules: RulesConfig,
    pub map: MapSnapshot,
    pub state: CombatState,
}

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── rules.toml
/// ├── weapons.ron
/// ├── maps/
/// │   └── crossroads.ron
/// └── rosters/
///     └── ambush.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load table rules from `rules.toml`. A missing file means default rules.
    pub fn load_rules(&self) -> LoadResult<RulesConfig> {
        let path = self.data_dir.join("rules.toml");
        if !path.exists() {
            return Ok(RulesConfig::default());
        }
        RulesLoader::load(&path)
    }

    /// Load the weapon catalog from `weapons.ron`.
    pub fn load_weapons(&self) -> LoadResult<WeaponCatalog> {
        let path = self.data_dir.join("weapons.ron");
        WeaponLoader::load(&path)
    }

    /// Load `maps/<name>.ron`.
    pub fn load_map(&self, name: &str) -> LoadResult<MapSnapshot> {
        let path = self.data_dir.join("maps").join(format!("{name}.ron"));
        MapLoader::load(&path)
    }

    /// Load `rosters/<name>.ron`, resolving weapons against `catalog`.
    pub fn load_roster(&self, name: &str, catalog: &WeaponCatalog) -> LoadResult<CombatState> {
        let path = self.data_dir.join("rosters").join(format!("{name}.ron"));
        let entities = RosterLoader::load(&path, catalog)?;
        Ok(CombatState::with_entities(entities))
    }

    /// Loads rules, weapons, a map and a roster, and checks that every token
    /// fits on the map without sharing a cell.
    pub fn load_encounter(&self, map: &str, roster: &str) -> LoadResult<Encounter> {
        let rules = self.load_rules()?;
        let catalog = self.load_weapons()?;
        let map = self.load_map(map)?;
        let state = self.load_roster(roster, &catalog)?;

        let mut occupied: BTreeMap<Position, &str> = BTreeMap::new();
        for entity in state.entities.iter() {
            for cell in entity.footprint().cells() {
                anyhow::ensure!(
                    map.dimensions.contains(cell),
                    "{} at ({}, {}) does not fit on the map",
                    entity.name,
                    entity.position.x,
                    entity.position.y
                );
                if let Some(other) = occupied.insert(cell, &entity.name) {
                    anyhow::bail!("{} and {} overlap at ({}, {})", other, entity.name, cell.x, cell.y);
                }
            }
        }

        Ok(Encounter { rules, map, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tabletop_core::EntityId;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn seed(dir: &Path, roster: &str) {
        write(dir, "weapons.ron", r#"[(name: "Spear", damage: "1d6", damage_type: Piercing, properties: ["thrown", "versatile"], range: Some((20, 60)))]"#);
        write(dir, "maps/yard.ron", "(dimensions: (6, 6))");
        write(dir, "rosters/patrol.ron", roster);
    }

    #[test]
    fn rules_default_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_rules().unwrap(), RulesConfig::default());
    }

    #[test]
    fn loads_an_encounter() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            dir.path(),
            r#"[
                (id: 1, name: "Guard", faction: Player, position: (1, 1), hit_points: 11, weapons: ["Spear"]),
                (id: 2, name: "Thief", faction: Enemy, position: (4, 4), hit_points: 9),
            ]"#,
        );
        write(dir.path(), "rules.toml", "feet_per_cell = 10\n");

        let encounter = ContentFactory::new(dir.path()).load_encounter("yard", "patrol").unwrap();
        assert_eq!(encounter.rules.feet_per_cell, 10);
        assert_eq!(encounter.state.entities.len(), 2);
        assert_eq!(encounter.state.entity(EntityId(1)).unwrap().weapons[0].name, "Spear");
    }

    #[test]
    fn overlapping_tokens_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            dir.path(),
            r#"[
                (id: 1, name: "Ogre", faction: Enemy, position: (1, 1), size: Large, hit_points: 59),
                (id: 2, name: "Squire", faction: Player, position: (2, 2), hit_points: 9),
            ]"#,
        );
        let err = ContentFactory::new(dir.path()).load_encounter("yard", "patrol").unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn tokens_off_the_map_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), r#"[(id: 1, name: "Scout", faction: Player, position: (9, 0), hit_points: 9)]"#);
        let err = ContentFactory::new(dir.path()).load_encounter("yard", "patrol").unwrap_err();
        assert!(err.to_string().contains("Scout"));
    }

    #[test]
    fn missing_map_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_map("nowhere").unwrap_err();
        assert!(err.to_string().contains("nowhere.ron"));
    }
}
