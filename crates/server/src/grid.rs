//! Grid geometry.
//!
//! The arena is a fixed square of integer cells. The border is lethal
//! rather than wrapping, so [`Grid::step`] happily returns coordinates
//! off the board and callers check [`Grid::in_bounds`] afterwards.

use glam::IVec2;
use protocol::Direction;

/// The playing field, a `size` x `size` square of cells.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        debug_assert!(size > 0, "grid size must be positive");
        Self { size }
    }

    /// Side length in cells.
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Whether `cell` lies on the board.
    #[inline]
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.x < self.size && cell.y >= 0 && cell.y < self.size
    }

    /// The cell one step from `cell` in `dir`. May be off the board.
    #[inline]
    pub fn step(&self, cell: IVec2, dir: Direction) -> IVec2 {
        let (dx, dy) = dir.delta();
        IVec2::new(cell.x + dx, cell.y + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let grid = Grid::new(30);
        assert!(grid.in_bounds(IVec2::new(0, 0)));
        assert!(grid.in_bounds(IVec2::new(29, 29)));
        assert!(!grid.in_bounds(IVec2::new(30, 0)));
        assert!(!grid.in_bounds(IVec2::new(0, 30)));
        assert!(!grid.in_bounds(IVec2::new(-1, 5)));
    }

    #[test]
    fn test_step_does_not_wrap() {
        let grid = Grid::new(30);
        let next = grid.step(IVec2::new(29, 5), Direction::Right);
        assert_eq!(next, IVec2::new(30, 5));
        assert!(!grid.in_bounds(next));
    }

    #[test]
    fn test_step_stop_stays_put() {
        let grid = Grid::new(30);
        let cell = IVec2::new(7, 9);
        assert_eq!(grid.step(cell, Direction::Stop), cell);
    }
}
