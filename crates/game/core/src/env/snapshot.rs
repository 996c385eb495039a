//! Owned map data implementing [`MapOracle`].
//!
//! Content loaders and tests build a [`MapSnapshot`]; the engine only ever
//! sees it through the oracle trait.

use std::collections::BTreeMap;

use super::map::{MapDimensions, MapOracle, Terrain};
use crate::geometry::WallSegment;
use crate::state::Position;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapSnapshot {
    pub dimensions: MapDimensions,
    pub walls: Vec<WallSegment>,
    pub terrain: BTreeMap<Position, Terrain>,
}

impl MapSnapshot {
    pub fn new(dimensions: MapDimensions) -> Self {
        Self {
            dimensions,
            walls: Vec::new(),
            terrain: BTreeMap::new(),
        }
    }

    pub fn with_wall(mut self, wall: WallSegment) -> Self {
        self.walls.push(wall);
        self
    }

    pub fn with_terrain(mut self, position: Position, terrain: Terrain) -> Self {
        self.terrain.insert(position, terrain);
        self
    }

    /// Copies any oracle into an owned snapshot.
    pub fn from_oracle(oracle: &dyn MapOracle) -> Self {
        let dimensions = oracle.dimensions();
        let mut terrain = BTreeMap::new();
        for y in 0..dimensions.height as i32 {
            for x in 0..dimensions.width as i32 {
                let position = Position::new(x, y);
                if let Some(cell) = oracle.terrain(position) {
                    terrain.insert(position, cell);
                }
            }
        }
        Self {
            dimensions,
            walls: oracle.walls().to_vec(),
            terrain,
        }
    }
}

impl MapOracle for MapSnapshot {
    fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    fn walls(&self) -> &[WallSegment] {
        &self.walls
    }

    fn terrain(&self, position: Position) -> Option<Terrain> {
        self.terrain.get(&position).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridPoint;

    #[test]
    fn terrain_multiplier_defaults_to_one() {
        let map = MapSnapshot::new(MapDimensions::new(10, 10))
            .with_terrain(Position::new(2, 2), Terrain::difficult());
        assert_eq!(map.movement_multiplier(Position::new(2, 2)), 2);
        assert_eq!(map.movement_multiplier(Position::new(3, 3)), 1);
        assert!(!map.contains(Position::new(10, 0)));
    }

    #[test]
    fn snapshot_copies_an_oracle() {
        let original = MapSnapshot::new(MapDimensions::new(4, 4))
            .with_wall(WallSegment::new(GridPoint::new(1.0, 0.0), GridPoint::new(1.0, 4.0)))
            .with_terrain(Position::new(0, 3), Terrain::water());
        assert_eq!(MapSnapshot::from_oracle(&original), original);
    }
}
