//! Spawn point selection.
//!
//! Spawns are sampled uniformly inside the margin with rejection
//! against the collision predicate. Attempts are bounded so a packed
//! board surfaces an error instead of spinning the tick loop.

use std::collections::HashMap;

use glam::IVec2;
use rand::Rng;
use thiserror::Error;

use crate::collision;
use crate::grid::Grid;
use crate::player::Player;

/// Sampling attempts before giving up on a free cell.
const MAX_ATTEMPTS: u32 = 200;

/// No free spawn cell could be found inside the margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no free spawn cell after {} attempts", MAX_ATTEMPTS)]
pub struct GridSaturated;

/// Pick a random free cell at least `margin` cells from the border.
pub fn random_spawn(
    grid: &Grid,
    players: &HashMap<u32, Player>,
    margin: i32,
) -> Result<IVec2, GridSaturated> {
    let lo = margin;
    let hi = grid.size() - 1 - margin;
    debug_assert!(lo <= hi, "spawn margin leaves no cells");

    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let cell = IVec2::new(rng.random_range(lo..=hi), rng.random_range(lo..=hi));
        if !collision::collides(grid, players, cell, None) {
            return Ok(cell);
        }
    }
    Err(GridSaturated)
}
