use std::collections::BTreeSet;

use super::{GridPoint, WallSegment};
use crate::state::{Footprint, Position};

fn cell_center(cell: Position) -> GridPoint {
    GridPoint::new(f64::from(cell.x) + 0.5, f64::from(cell.y) + 0.5)
}

/// Centre-to-centre sight line between two footprints, blocked by any wall.
pub fn has_line_of_sight(from: &Footprint, to: &Footprint, walls: &[WallSegment]) -> bool {
    let a = GridPoint::from(from.center());
    let b = GridPoint::from(to.center());
    !walls.iter().any(|wall| wall.crosses(a, b))
}

/// Cells within `radius` (Chebyshev, in cells) whose centre can be seen from
/// the centre of `origin`.
pub fn visible_cells(origin: Position, radius: u32, walls: &[WallSegment]) -> BTreeSet<Position> {
    let r = radius as i32;
    let eye = cell_center(origin);
    let mut cells = BTreeSet::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let cell = origin.offset(dx, dy);
            let target = cell_center(cell);
            if !walls.iter().any(|wall| wall.crosses(eye, target)) {
                cells.insert(cell);
            }
        }
    }
    cells
}
