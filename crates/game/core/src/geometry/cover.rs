//! Cover between two tokens.
//!
//! Walls are sampled corner to corner: from each of the four corners of the
//! attacker's cell, trace to the four corners of the target's cell and count
//! the lines a wall blocks. The attacker uses its best corner, so cover
//! follows the fewest blocked lines (0 none, 1-2 half, 3 three-quarters,
//! 4 total). Corners are pulled slightly inward so a wall running exactly
//! along a cell edge does not block lines that merely graze it.
//!
//! Other tokens standing on the centre-to-centre line grant at least half
//! cover.

use super::{GridPoint, WallSegment, segment_hits_box};
use crate::config::RulesConfig;
use crate::state::{Footprint, Position};

const CORNER_INSET: f64 = 0.01;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoverCategory {
    #[default]
    None,
    Half,
    #[strum(to_string = "Three-Quarters")]
    ThreeQuarters,
    Total,
}

impl CoverCategory {
    pub fn from_blocked_lines(blocked: usize) -> Self {
        match blocked {
            0 => Self::None,
            1 | 2 => Self::Half,
            3 => Self::ThreeQuarters,
            _ => Self::Total,
        }
    }

    /// AC bonus granted; `None` when the target cannot be targeted at all.
    pub fn ac_bonus(self, rules: &RulesConfig) -> Option<i32> {
        match self {
            Self::None => Some(0),
            Self::Half => Some(rules.half_cover_bonus),
            Self::ThreeQuarters => Some(rules.three_quarters_cover_bonus),
            Self::Total => None,
        }
    }
}

fn inset_corners(cell: Position) -> [GridPoint; 4] {
    let x = f64::from(cell.x);
    let y = f64::from(cell.y);
    let near = CORNER_INSET;
    let far = 1.0 - CORNER_INSET;
    [
        GridPoint::new(x + near, y + near),
        GridPoint::new(x + far, y + near),
        GridPoint::new(x + near, y + far),
        GridPoint::new(x + far, y + far),
    ]
}

/// Wall cover between two single cells.
pub fn wall_cover(attacker: Position, target: Position, walls: &[WallSegment]) -> CoverCategory {
    if walls.is_empty() {
        return CoverCategory::None;
    }
    let targets = inset_corners(target);
    let fewest_blocked = inset_corners(attacker)
        .into_iter()
        .map(|from| {
            targets
                .iter()
                .filter(|&&to| walls.iter().any(|wall| wall.crosses(from, to)))
                .count()
        })
        .min()
        .unwrap_or(0);
    CoverCategory::from_blocked_lines(fewest_blocked)
}

/// Whether any blocker's footprint sits on the centre-to-centre line.
pub fn token_blocks(attacker: &Footprint, target: &Footprint, blockers: &[Footprint]) -> bool {
    let from = GridPoint::from(attacker.center());
    let to = GridPoint::from(target.center());
    blockers.iter().any(|blocker| {
        let side = f64::from(blocker.side.max(1));
        let min = GridPoint::new(
            f64::from(blocker.origin.x) + CORNER_INSET,
            f64::from(blocker.origin.y) + CORNER_INSET,
        );
        let max = GridPoint::new(min.x + side - 2.0 * CORNER_INSET, min.y + side - 2.0 * CORNER_INSET);
        segment_hits_box(from, to, min, max)
    })
}

/// Cover the target has against the attacker.
///
/// Multi-cell tokens use whichever pair of occupied cells gives the least
/// wall cover. `blockers` must not include the attacker or the target.
pub fn calculate_cover(
    attacker: &Footprint,
    target: &Footprint,
    walls: &[WallSegment],
    blockers: &[Footprint],
) -> CoverCategory {
    let from_walls = attacker
        .cells()
        .flat_map(|a| target.cells().map(move |t| (a, t)))
        .map(|(a, t)| wall_cover(a, t, walls))
        .min()
        .unwrap_or_default();

    if token_blocks(attacker, target, blockers) {
        from_walls.max(CoverCategory::Half)
    } else {
        from_walls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(x1: f64, y1: f64, x2: f64, y2: f64) -> WallSegment {
        WallSegment::new(GridPoint::new(x1, y1), GridPoint::new(x2, y2))
    }

    fn cell(x: i32, y: i32) -> Footprint {
        Footprint::single(Position::new(x, y))
    }

    #[test]
    fn open_ground_gives_no_cover() {
        assert_eq!(calculate_cover(&cell(0, 0), &cell(3, 0), &[], &[]), CoverCategory::None);
    }

    #[test]
    fn low_wall_blocks_some_lines() {
        let walls = [wall(2.0, -1.0, 2.0, 0.55)];
        assert_eq!(calculate_cover(&cell(0, 0), &cell(3, 0), &walls, &[]), CoverCategory::Half);
    }

    #[test]
    fn arrow_slit_leaves_one_line_open() {
        let walls = [wall(2.0, -5.0, 2.0, 0.45), wall(2.0, 0.55, 2.0, 5.0)];
        assert_eq!(
            calculate_cover(&cell(0, 0), &cell(3, 0), &walls, &[]),
            CoverCategory::ThreeQuarters
        );
    }

    #[test]
    fn solid_wall_is_total_cover() {
        let walls = [wall(2.0, -5.0, 2.0, 5.0)];
        let cover = calculate_cover(&cell(0, 0), &cell(3, 0), &walls, &[]);
        assert_eq!(cover, CoverCategory::Total);
        assert_eq!(cover.ac_bonus(&RulesConfig::default()), None);
    }

    #[test]
    fn wall_along_a_cell_edge_does_not_block_neighbours() {
        let walls = [wall(0.0, 1.0, 5.0, 1.0)];
        assert_eq!(calculate_cover(&cell(0, 0), &cell(3, 0), &walls, &[]), CoverCategory::None);
    }

    #[test]
    fn tokens_in_the_way_give_half_cover() {
        let blockers = [cell(1, 0)];
        assert_eq!(
            calculate_cover(&cell(0, 0), &cell(2, 0), &[], &blockers),
            CoverCategory::Half
        );
        let off_line = [cell(1, 2)];
        assert_eq!(
            calculate_cover(&cell(0, 0), &cell(2, 0), &[], &off_line),
            CoverCategory::None
        );
    }

    #[test]
    fn token_cover_never_lowers_wall_cover() {
        let walls = [wall(2.0, -5.0, 2.0, 0.45), wall(2.0, 0.55, 2.0, 5.0)];
        let blockers = [cell(1, 0)];
        assert_eq!(
            calculate_cover(&cell(0, 0), &cell(3, 0), &walls, &blockers),
            CoverCategory::ThreeQuarters
        );
    }

    #[test]
    fn bonuses_follow_rules() {
        let rules = RulesConfig::default();
        assert_eq!(CoverCategory::None.ac_bonus(&rules), Some(0));
        assert_eq!(CoverCategory::Half.ac_bonus(&rules), Some(2));
        assert_eq!(CoverCategory::ThreeQuarters.ac_bonus(&rules), Some(5));
    }
}
