//! Validated movement directions.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A movement direction on the grid.
///
/// Covers the four cardinal moves plus [`Direction::Stop`], the rest
/// state every player spawns in. Clients submit raw `(dx, dy)` vectors;
/// anything outside this set is rejected at the boundary via
/// [`TryFrom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Stop,
}

impl Direction {
    /// The per-tick grid delta for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Stop => (0, 0),
        }
    }

    /// Whether switching from `self` to `next` would fold the player back
    /// onto its own trail. True exactly when the two deltas cancel.
    pub const fn reverses(self, next: Direction) -> bool {
        let (dx, dy) = self.delta();
        let (ndx, ndy) = next.delta();
        dx + ndx == 0 && dy + ndy == 0
    }
}

impl TryFrom<(i32, i32)> for Direction {
    type Error = ProtocolError;

    fn try_from((dx, dy): (i32, i32)) -> Result<Self, Self::Error> {
        match (dx, dy) {
            (0, -1) => Ok(Direction::Up),
            (0, 1) => Ok(Direction::Down),
            (-1, 0) => Ok(Direction::Left),
            (1, 0) => Ok(Direction::Right),
            (0, 0) => Ok(Direction::Stop),
            _ => Err(ProtocolError::InvalidDirection { dx, dy }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_vectors_parse() {
        assert_eq!(Direction::try_from((0, -1)).unwrap(), Direction::Up);
        assert_eq!(Direction::try_from((0, 1)).unwrap(), Direction::Down);
        assert_eq!(Direction::try_from((-1, 0)).unwrap(), Direction::Left);
        assert_eq!(Direction::try_from((1, 0)).unwrap(), Direction::Right);
        assert_eq!(Direction::try_from((0, 0)).unwrap(), Direction::Stop);
    }

    #[test]
    fn test_off_axis_vectors_rejected() {
        for bad in [(1, 1), (-1, -1), (2, 0), (0, -3), (7, 5)] {
            assert!(Direction::try_from(bad).is_err());
        }
    }

    #[test]
    fn test_opposite_directions_reverse() {
        assert!(Direction::Right.reverses(Direction::Left));
        assert!(Direction::Left.reverses(Direction::Right));
        assert!(Direction::Up.reverses(Direction::Down));
        assert!(Direction::Down.reverses(Direction::Up));
    }

    #[test]
    fn test_stopping_and_turning_allowed() {
        // Braking is not a reversal, and neither is setting off from rest.
        assert!(!Direction::Right.reverses(Direction::Stop));
        assert!(!Direction::Stop.reverses(Direction::Right));
        assert!(!Direction::Right.reverses(Direction::Up));
        assert!(!Direction::Down.reverses(Direction::Left));
    }

    #[test]
    fn test_delta_matches_variant() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Stop.delta(), (0, 0));
    }
}
