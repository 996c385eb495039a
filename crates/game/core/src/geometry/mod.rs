//! Grid geometry: directions, cover and area rasterization.
//!
//! Cells are unit squares; cell `(x, y)` spans `[x, x+1) × [y, y+1)` in
//! continuous grid coordinates, which is the space walls live in.
pub mod area;
pub mod cover;
pub mod direction;
pub mod vision;

pub use area::{AreaShape, AreaShapeKind, affected_cells};
pub use cover::{CoverCategory, calculate_cover};
pub use direction::Direction;
pub use vision::{has_line_of_sight, visible_cells};

const EPSILON: f64 = 1e-9;

/// Point in continuous grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

impl GridPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for GridPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A wall between two grid points. Blocks sight and attacks.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallSegment {
    pub start: GridPoint,
    pub end: GridPoint,
}

impl WallSegment {
    pub const fn new(start: GridPoint, end: GridPoint) -> Self {
        Self { start, end }
    }

    pub fn crosses(&self, from: GridPoint, to: GridPoint) -> bool {
        segments_intersect(from, to, self.start, self.end)
    }
}

fn cross(o: GridPoint, a: GridPoint, b: GridPoint) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn sign(value: f64) -> i8 {
    if value > EPSILON {
        1
    } else if value < -EPSILON {
        -1
    } else {
        0
    }
}

fn within_box(a: GridPoint, b: GridPoint, p: GridPoint) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Closed segment intersection; touching endpoints count.
pub(crate) fn segments_intersect(p1: GridPoint, p2: GridPoint, q1: GridPoint, q2: GridPoint) -> bool {
    let d1 = sign(cross(q1, q2, p1));
    let d2 = sign(cross(q1, q2, p2));
    let d3 = sign(cross(p1, p2, q1));
    let d4 = sign(cross(p1, p2, q2));

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    (d1 == 0 && within_box(q1, q2, p1))
        || (d2 == 0 && within_box(q1, q2, p2))
        || (d3 == 0 && within_box(p1, p2, q1))
        || (d4 == 0 && within_box(p1, p2, q2))
}

/// Liang-Barsky clip: does the segment pass through the axis-aligned box?
pub(crate) fn segment_hits_box(from: GridPoint, to: GridPoint, min: GridPoint, max: GridPoint) -> bool {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, from.x - min.x),
        (dx, max.x - from.x),
        (-dy, from.y - min.y),
        (dy, max.y - from.y),
    ] {
        if p.abs() < EPSILON {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn crossing_and_parallel_segments() {
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(0.0, 1.0), p(2.0, 1.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 3.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(2.0, -1.0), p(2.0, 1.0)));
    }

    #[test]
    fn liang_barsky_clips_boxes() {
        let min = p(1.0, 1.0);
        let max = p(2.0, 2.0);
        assert!(segment_hits_box(p(0.0, 1.5), p(3.0, 1.5), min, max));
        assert!(!segment_hits_box(p(0.0, 0.5), p(3.0, 0.5), min, max));
        assert!(!segment_hits_box(p(0.0, 0.0), p(0.9, 0.9), min, max));
    }
}
