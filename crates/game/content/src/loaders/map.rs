//! Battle map loader.
//!
//! A map file carries the grid size, wall segments and special terrain.
//! Tokens are placed by roster files, not here.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tabletop_core::geometry::GridPoint;
use tabletop_core::{MapDimensions, MapSnapshot, Position, Terrain, WallSegment};

use crate::loaders::{LoadResult, read_file};

/// Map data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    dimensions: (u32, u32),
    #[serde(default)]
    walls: Vec<((f64, f64), (f64, f64))>,
    #[serde(default)]
    terrain: Vec<(i32, i32, Terrain)>, // (x, y, terrain)
}

/// Loader for battle maps from RON files.
pub struct MapLoader;

impl MapLoader {
    pub fn load(path: &Path) -> LoadResult<MapSnapshot> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<MapSnapshot> {
        let data: MapDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;

        let (width, height) = data.dimensions;
        anyhow::ensure!(width > 0 && height > 0, "Map must be at least 1x1, got {}x{}", width, height);
        let mut map = MapSnapshot::new(MapDimensions::new(width, height));

        for (start, end) in data.walls {
            map = map.with_wall(WallSegment::new(GridPoint::from(start), GridPoint::from(end)));
        }

        for (x, y, terrain) in data.terrain {
            let position = Position::new(x, y);
            anyhow::ensure!(
                map.dimensions.contains(position),
                "Terrain at ({}, {}) lies outside the {}x{} map",
                x,
                y,
                width,
                height
            );
            anyhow::ensure!(terrain.cost_multiplier > 0, "Terrain at ({}, {}) has zero movement cost", x, y);
            map = map.with_terrain(position, terrain);
        }

        Ok(map)
    }
}
