//! Read-only inputs to rules resolution.
//!
//! The [`CombatEnv`] aggregate bundles the active map (if any) and the rule
//! table. Randomness is passed separately as a `&mut dyn RandomSource`
//! because it is the one input that changes as it is used.
mod error;
mod map;
mod rng;
mod snapshot;

pub use error::OracleError;
pub use map::{MapDimensions, MapOracle, Terrain, TerrainKind};
pub use rng::{PcgRng, RandomSource, SequenceRng};
pub use snapshot::MapSnapshot;

use crate::config::RulesConfig;
use crate::geometry::WallSegment;

static DEFAULT_RULES: RulesConfig = RulesConfig::new();

#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    map: Option<&'a dyn MapOracle>,
    rules: Option<&'a RulesConfig>,
}

impl<'a> CombatEnv<'a> {
    pub fn new(map: Option<&'a dyn MapOracle>, rules: Option<&'a RulesConfig>) -> Self {
        Self { map, rules }
    }

    pub fn with_map(map: &'a dyn MapOracle, rules: &'a RulesConfig) -> Self {
        Self::new(Some(map), Some(rules))
    }

    /// No map, default rules.
    pub fn empty() -> Self {
        Self::new(None, None)
    }

    /// Returns the active map, or an error if none is loaded.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::MapNotAvailable` if no map oracle was provided.
    pub fn map(&self) -> Result<&'a dyn MapOracle, OracleError> {
        self.map.ok_or(OracleError::MapNotAvailable)
    }

    /// Rule table in force; the 2024 defaults when none was provided.
    pub fn rules(&self) -> &'a RulesConfig {
        self.rules.unwrap_or(&DEFAULT_RULES)
    }

    /// Walls of the active map; none without a map.
    pub fn walls(&self) -> &'a [WallSegment] {
        self.map.map(|map| map.walls()).unwrap_or(&[])
    }
}

impl core::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("map", &self.map.map(|map| map.dimensions()))
            .field("rules", &self.rules())
            .finish()
    }
}
