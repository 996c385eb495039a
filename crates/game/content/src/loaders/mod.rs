//! Content loaders for reading game data from files.
//!
//! Each loader is a unit struct with a `load` function that parses one file
//! into core types. [`ContentFactory`] ties them to a data directory.

pub mod factory;
pub mod map;
pub mod roster;
pub mod rules;
pub mod weapons;

pub use factory::{ContentFactory, Encounter};
pub use map::MapLoader;
pub use roster::{CombatantSpec, RosterLoader};
pub use rules::RulesLoader;
pub use weapons::{WeaponCatalog, WeaponLoader, WeaponSpec};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Maps a flag written in data files to its bitflags name:
/// `"two-handed"` -> `"TWO_HANDED"`.
pub(crate) fn flag_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
