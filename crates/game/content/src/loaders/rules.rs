//! Table rules loader.

use std::path::Path;

use tabletop_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`RulesConfig`] from TOML files.
///
/// Missing keys fall back to the 2024 defaults, so a house-rules file only
/// lists what it changes.
pub struct RulesLoader;

impl RulesLoader {
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        let rules: RulesConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {}", e))?;

        anyhow::ensure!(rules.feet_per_cell > 0, "feet_per_cell must be positive");
        anyhow::ensure!(
            (2..=20).contains(&rules.crit_threshold),
            "crit_threshold must be between 2 and 20, got {}",
            rules.crit_threshold
        );
        Ok(rules)
    }
}
