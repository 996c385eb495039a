use std::fmt;

/// Unique identifier for any token tracked in the combat store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete grid position expressed in cell coordinates.
///
/// `y` grows downward (screen coordinates), so north is `y - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Grid distance where diagonal steps cost the same as orthogonal ones.
    pub fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Square block of cells occupied by a token, anchored at its top-left cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub origin: Position,
    pub side: u32,
}

impl Footprint {
    pub const fn new(origin: Position, side: u32) -> Self {
        Self { origin, side }
    }

    pub const fn single(origin: Position) -> Self {
        Self { origin, side: 1 }
    }

    fn max_x(&self) -> i32 {
        self.origin.x + self.side.max(1) as i32 - 1
    }

    fn max_y(&self) -> i32 {
        self.origin.y + self.side.max(1) as i32 - 1
    }

    pub fn contains(&self, cell: Position) -> bool {
        (self.origin.x..=self.max_x()).contains(&cell.x)
            && (self.origin.y..=self.max_y()).contains(&cell.y)
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        let side = self.side.max(1) as i32;
        (0..side).flat_map(move |dy| (0..side).map(move |dx| self.origin.offset(dx, dy)))
    }

    /// Chebyshev distance between the nearest cells of two footprints.
    ///
    /// Adjacent footprints are 1 apart; overlapping ones are 0.
    pub fn gap(&self, other: &Footprint) -> u32 {
        let gap_x = axis_gap(self.origin.x, self.max_x(), other.origin.x, other.max_x());
        let gap_y = axis_gap(self.origin.y, self.max_y(), other.origin.y, other.max_y());
        gap_x.max(gap_y)
    }

    /// Centre of the footprint in continuous grid coordinates.
    pub fn center(&self) -> (f64, f64) {
        let half = f64::from(self.side.max(1)) / 2.0;
        (
            f64::from(self.origin.x) + half,
            f64::from(self.origin.y) + half,
        )
    }
}

fn axis_gap(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> u32 {
    if b_min > a_max {
        (b_min - a_max) as u32
    } else if a_min > b_max {
        (a_min - b_max) as u32
    } else {
        0
    }
}
