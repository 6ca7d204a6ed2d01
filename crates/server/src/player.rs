//! Player entities and their persistent identities.

use std::collections::VecDeque;

use glam::IVec2;
use protocol::{Color, Direction};

/// A live player on the grid.
///
/// One exists per connection. It is created at spawn and dropped on
/// disconnect; score and color outlive it in an [`IdentityRecord`].
#[derive(Debug, Clone)]
pub struct Player {
    /// Session id, shared with the identity record.
    pub id: u32,
    /// Head cell.
    pub position: IVec2,
    /// Current movement direction.
    pub direction: Direction,
    /// Light trail cells, oldest first.
    pub trail: VecDeque<IVec2>,
    /// False once the player has collided this round.
    pub alive: bool,
}

impl Player {
    pub fn new(id: u32, position: IVec2) -> Self {
        Self {
            id,
            position,
            direction: Direction::Stop,
            trail: VecDeque::new(),
            alive: true,
        }
    }

    /// Append the vacated head cell to the trail, dropping the oldest
    /// segment once `max_len` is exceeded.
    pub fn extend_trail(&mut self, cell: IVec2, max_len: usize) {
        self.trail.push_back(cell);
        while self.trail.len() > max_len {
            self.trail.pop_front();
        }
    }

    /// Reset to a freshly spawned state at `position`.
    pub fn respawn(&mut self, position: IVec2) {
        self.position = position;
        self.direction = Direction::Stop;
        self.trail.clear();
        self.alive = true;
    }
}

/// Score and color for one session id, kept for the lifetime of the
/// process even while no matching [`Player`] is connected.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    /// Display color, picked at first connect.
    pub color: Color,
    /// Accumulated points. Never decreases.
    pub score: u32,
}
