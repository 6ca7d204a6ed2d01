//! Collision detection.
//!
//! One pure predicate shared by movement resolution and the spawn
//! locator: a candidate cell is checked against the border, every
//! trail, and every head. Corpses stay on the board until the next
//! respawn, so their heads and trails count like any other.

use std::collections::HashMap;

use glam::IVec2;

use crate::grid::Grid;
use crate::player::Player;

/// Whether `cell` is lethal or otherwise unusable.
///
/// `exclude` names one head to skip: a moving player vacates its own
/// head cell, so movement checks pass their own id. Spawn checks pass
/// `None` and collide with every head.
pub fn collides(
    grid: &Grid,
    players: &HashMap<u32, Player>,
    cell: IVec2,
    exclude: Option<u32>,
) -> bool {
    if !grid.in_bounds(cell) {
        return true;
    }
    for player in players.values() {
        if player.trail.contains(&cell) {
            return true;
        }
        if player.position == cell && exclude != Some(player.id) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(players: impl IntoIterator<Item = Player>) -> HashMap<u32, Player> {
        players.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_border_collides() {
        let grid = Grid::new(10);
        let players = HashMap::new();
        assert!(collides(&grid, &players, IVec2::new(-1, 4), None));
        assert!(collides(&grid, &players, IVec2::new(10, 4), None));
        assert!(!collides(&grid, &players, IVec2::new(0, 4), None));
    }

    #[test]
    fn test_trail_collides_even_for_owner() {
        let grid = Grid::new(10);
        let mut player = Player::new(1, IVec2::new(5, 5));
        player.extend_trail(IVec2::new(4, 5), 300);
        let players = roster([player]);

        assert!(collides(&grid, &players, IVec2::new(4, 5), Some(1)));
    }

    #[test]
    fn test_head_respects_exclusion() {
        let grid = Grid::new(10);
        let players = roster([Player::new(1, IVec2::new(5, 5))]);

        assert!(collides(&grid, &players, IVec2::new(5, 5), None));
        assert!(collides(&grid, &players, IVec2::new(5, 5), Some(2)));
        assert!(!collides(&grid, &players, IVec2::new(5, 5), Some(1)));
    }

    #[test]
    fn test_free_cell_is_free() {
        let grid = Grid::new(10);
        let players = roster([Player::new(1, IVec2::new(5, 5))]);
        assert!(!collides(&grid, &players, IVec2::new(2, 2), None));
    }
}
