//! Weapon catalog loader.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tabletop_core::DamageType;
use tabletop_core::state::{MasteryKind, Weapon, WeaponKind, WeaponProperties};

use crate::loaders::{LoadResult, flag_name, read_file};

/// One catalog entry as written in RON.
///
/// Properties are written by name (`"finesse"`, `"two-handed"`) rather than
/// as raw bits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub name: String,
    pub damage: String,
    pub damage_type: DamageType,
    #[serde(default)]
    pub kind: WeaponKind,
    #[serde(default)]
    pub properties: Vec<String>,
    /// (normal, long) in feet.
    #[serde(default)]
    pub range: Option<(u32, u32)>,
    #[serde(default)]
    pub mastery: Option<MasteryKind>,
    #[serde(default = "default_proficient")]
    pub proficient: bool,
}

fn default_proficient() -> bool {
    true
}

impl WeaponSpec {
    pub fn build(&self) -> LoadResult<Weapon> {
        let mut properties = WeaponProperties::empty();
        for name in &self.properties {
            let flag = WeaponProperties::from_name(&flag_name(name)).ok_or_else(|| {
                anyhow::anyhow!("Unknown weapon property '{}' on {}", name, self.name)
            })?;
            properties |= flag;
        }

        let mut weapon = Weapon::new(self.name.clone(), self.damage.clone(), self.damage_type, self.kind)
            .with_properties(properties)
            .with_proficiency(self.proficient);
        if let Some((normal, long)) = self.range {
            anyhow::ensure!(normal <= long, "{}: normal range exceeds long range", self.name);
            weapon = weapon.with_range(normal, long);
        }
        if let Some(mastery) = self.mastery {
            weapon = weapon.with_mastery(mastery);
        }
        Ok(weapon)
    }
}


/// Weapons by name. Lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeaponCatalog {
    weapons: BTreeMap<String, Weapon>,
}

impl WeaponCatalog {
    pub fn get(&self, name: &str) -> Option<&Weapon> {
        self.weapons.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.values()
    }

    fn insert(&mut self, weapon: Weapon) -> LoadResult<()> {
        let key = weapon.name.to_lowercase();
        anyhow::ensure!(!self.weapons.contains_key(&key), "Duplicate weapon '{}'", weapon.name);
        self.weapons.insert(key, weapon);
        Ok(())
    }
}

/// Loader for weapon catalogs from RON files.
pub struct WeaponLoader;

impl WeaponLoader {
    pub fn load(path: &Path) -> LoadResult<WeaponCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<WeaponCatalog> {
        let specs: Vec<WeaponSpec> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse weapons RON: {}", e))?;

        let mut catalog = WeaponCatalog::default();
        for spec in &specs {
            catalog.insert(spec.build()?)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        (
            name: "Glaive",
            damage: "1d10",
            damage_type: Slashing,
            properties: ["heavy", "reach", "two-handed"],
            mastery: Some(Graze),
        ),
        (
            name: "Longbow",
            damage: "1d8",
            damage_type: Piercing,
            kind: Ranged,
            properties: ["ammunition", "heavy", "two handed"],
            range: Some((150, 600)),
            mastery: Some(Slow),
        ),
    ]"#;

    #[test]
    fn parses_properties_by_name() {
        let catalog = WeaponLoader::parse(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let glaive = catalog.get("glaive").unwrap();
        assert!(glaive.has(WeaponProperties::REACH | WeaponProperties::TWO_HANDED));
        assert_eq!(glaive.reach_feet(), 10);
        assert_eq!(glaive.mastery, Some(MasteryKind::Graze));
        assert!(glaive.proficient);

        let bow = catalog.get("LONGBOW").unwrap();
        assert!(bow.is_ranged());
        assert_eq!(bow.range.map(|r| (r.normal, r.long)), Some((150, 600)));
    }

    #[test]
    fn unknown_property_is_an_error() {
        let err = WeaponLoader::parse(r#"[(name: "Whip", damage: "1d4", damage_type: Slashing, properties: ["bendy"])]"#)
            .unwrap_err();
        assert!(err.to_string().contains("bendy"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let twice = r#"[
            (name: "Dagger", damage: "1d4", damage_type: Piercing),
            (name: "dagger", damage: "1d4", damage_type: Piercing),
        ]"#;
        assert!(WeaponLoader::parse(twice).is_err());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let bad = r#"[(name: "Sling", damage: "1d4", damage_type: Bludgeoning, kind: Ranged, range: Some((120, 30)))]"#;
        assert!(WeaponLoader::parse(bad).is_err());
    }
}
