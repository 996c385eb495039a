/// Eight compass directions in screen coordinates (north is `y - 1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[strum(to_string = "North", serialize = "n")]
    North,
    #[strum(to_string = "NorthEast", serialize = "ne")]
    NorthEast,
    #[strum(to_string = "East", serialize = "e")]
    East,
    #[strum(to_string = "SouthEast", serialize = "se")]
    SouthEast,
    #[strum(to_string = "South", serialize = "s")]
    South,
    #[strum(to_string = "SouthWest", serialize = "sw")]
    SouthWest,
    #[strum(to_string = "West", serialize = "w")]
    West,
    #[strum(to_string = "NorthWest", serialize = "nw")]
    NorthWest,
}

impl Direction {
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Direction of a step whose components have the given signs.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn deltas_invert_through_from_delta() {
        for direction in Direction::iter() {
            let (dx, dy) = direction.delta();
            assert_eq!(Direction::from_delta(dx * 3, dy * 3), Some(direction));
        }
        assert_eq!(Direction::from_delta(0, 0), None);
    }

    #[test]
    fn north_points_up_the_screen() {
        assert_eq!(Direction::North.delta(), (0, -1));
        assert!(Direction::SouthWest.is_diagonal());
        assert_eq!("se".parse::<Direction>(), Ok(Direction::SouthEast));
    }
}
