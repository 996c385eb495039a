//! Rasterizes area-of-effect shapes into grid cells.
//!
//! Sizes are in feet and converted to cells with `ceil(size / feet_per_cell)`.
//! Lines and cones start at the caster and never include the origin cell.

use std::collections::BTreeSet;

use super::Direction;
use crate::state::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaShapeKind {
    Cone,
    Cube,
    Cylinder,
    Emanation,
    Line,
    Sphere,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaShape {
    pub kind: AreaShapeKind,
    pub size_feet: u32,
    pub origin: Position,
    /// Required for cones and lines; east when absent.
    pub direction: Option<Direction>,
    /// Line width in feet; 5 when absent.
    pub width_feet: Option<u32>,
    /// Side of the emanating creature's footprint, in cells; 1 when absent.
    pub footprint: Option<u32>,
}

impl AreaShape {
    pub fn new(kind: AreaShapeKind, size_feet: u32, origin: Position) -> Self {
        Self {
            kind,
            size_feet,
            origin,
            direction: None,
            width_feet: None,
            footprint: None,
        }
    }

    pub fn toward(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_width(mut self, width_feet: u32) -> Self {
        self.width_feet = Some(width_feet);
        self
    }

    pub fn with_footprint(mut self, side: u32) -> Self {
        self.footprint = Some(side);
        self
    }
}

/// Cells touched by `shape`. Deterministic; ordering comes from the set.
pub fn affected_cells(shape: &AreaShape, feet_per_cell: u32) -> BTreeSet<Position> {
    let length = shape.size_feet.div_ceil(feet_per_cell.max(1)) as i32;
    let direction = shape.direction.unwrap_or(Direction::East);
    let origin = shape.origin;

    match shape.kind {
        AreaShapeKind::Cube => square(origin, 0, length - 1, 0, length - 1),
        AreaShapeKind::Sphere | AreaShapeKind::Cylinder => {
            square(origin, -length, length, -length, length)
        }
        AreaShapeKind::Emanation => {
            let side = shape.footprint.unwrap_or(1).max(1) as i32;
            square(origin, -length, side - 1 + length, -length, side - 1 + length)
        }
        AreaShapeKind::Line => {
            let half_width = (shape.width_feet.unwrap_or(5) / 10) as i32;
            line(origin, direction, length, half_width)
        }
        AreaShapeKind::Cone => cone(origin, direction, length),
    }
}

fn square(origin: Position, min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> BTreeSet<Position> {
    let mut cells = BTreeSet::new();
    for dy in min_y..=max_y {
        for dx in min_x..=max_x {
            cells.insert(origin.offset(dx, dy));
        }
    }
    cells
}

fn line(origin: Position, direction: Direction, length: i32, half_width: i32) -> BTreeSet<Position> {
    let (dx, dy) = direction.delta();
    let mut cells = BTreeSet::new();
    for step in 1..=length {
        let center = origin.offset(dx * step, dy * step);
        if direction.is_diagonal() {
            for oy in -half_width..=half_width {
                let spread = half_width - oy.abs();
                for ox in -spread..=spread {
                    cells.insert(center.offset(ox, oy));
                }
            }
        } else {
            // perpendicular to (dx, dy)
            let (px, py) = (-dy, dx);
            for k in -half_width..=half_width {
                cells.insert(center.offset(px * k, py * k));
            }
        }
    }
    cells.remove(&origin);
    cells
}

fn cone(origin: Position, direction: Direction, length: i32) -> BTreeSet<Position> {
    let (dx, dy) = direction.delta();
    let mut cells = BTreeSet::new();
    if direction.is_diagonal() {
        for a in 0..=length {
            for b in 0..=(length - a) {
                if a + b > 0 {
                    cells.insert(origin.offset(dx * a, dy * b));
                }
            }
        }
    } else {
        let (px, py) = (-dy, dx);
        for distance in 1..=length {
            let center = origin.offset(dx * distance, dy * distance);
            for k in -distance..=distance {
                cells.insert(center.offset(px * k, py * k));
            }
        }
    }
    cells
}
