use crate::geometry::WallSegment;
use crate::state::Position;

/// Read-only battle map: bounds, walls and terrain costs.
pub trait MapOracle: Send + Sync {
    fn dimensions(&self) -> MapDimensions;

    fn walls(&self) -> &[WallSegment];

    /// Terrain at a cell; `None` means ordinary ground.
    fn terrain(&self, position: Position) -> Option<Terrain>;

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position)
    }

    /// Movement cost multiplier for entering `position`.
    fn movement_multiplier(&self, position: Position) -> u32 {
        self.terrain(position)
            .map(|terrain| terrain.cost_multiplier.max(1))
            .unwrap_or(1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    Difficult,
    Water,
    Custom(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Terrain {
    pub kind: TerrainKind,
    pub cost_multiplier: u32,
}

impl Terrain {
    pub const fn difficult() -> Self {
        Self {
            kind: TerrainKind::Difficult,
            cost_multiplier: 2,
        }
    }

    pub const fn water() -> Self {
        Self {
            kind: TerrainKind::Water,
            cost_multiplier: 2,
        }
    }
}
