//! Data-driven content definitions and loaders.
//!
//! This crate turns RON/TOML data files into the values the rules engine
//! consumes:
//! - Table rules (TOML)
//! - Weapon catalogs (RON)
//! - Battle maps: walls and terrain (RON)
//! - Encounter rosters (RON)
//!
//! Content is read once when a session starts. Nothing here touches
//! [`tabletop_core::CombatState`] after that.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    CombatantSpec, ContentFactory, Encounter, MapLoader, RosterLoader, RulesLoader, WeaponCatalog, WeaponLoader,
    WeaponSpec,
};
