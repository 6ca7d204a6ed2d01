//! The player roster and movement resolution.
//!
//! Players are round-scoped and vanish on disconnect; identity records
//! (color, score) stay for the lifetime of the process. Movement is
//! resolved in phases against the pre-move roster so the outcome never
//! depends on iteration order: a head-to-head crash kills both sides
//! no matter which player was processed first.

use std::collections::{HashMap, HashSet};

use glam::IVec2;
use rand::Rng;
use tracing::debug;

use protocol::messages::DeathCause;
use protocol::{Color, Direction};

use crate::config::GameConfig;
use crate::grid::Grid;
use crate::player::{IdentityRecord, Player};
use crate::spawn::{self, GridSaturated};

/// A death recorded during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    pub player_id: u32,
    pub cause: DeathCause,
}

/// All connected players plus their persistent identities.
#[derive(Debug)]
pub struct Arena {
    grid: Grid,
    max_trail_length: usize,
    spawn_margin: i32,
    pub(crate) players: HashMap<u32, Player>,
    pub(crate) identities: HashMap<u32, IdentityRecord>,
}

impl Arena {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            grid: Grid::new(config.grid_size),
            max_trail_length: config.max_trail_length,
            spawn_margin: config.spawn_margin,
            players: HashMap::new(),
            identities: HashMap::new(),
        }
    }

    /// Register a connection under `id`: reuse or mint the identity,
    /// then spawn a fresh player on a free cell.
    pub fn add_player(&mut self, id: u32) -> Result<Color, GridSaturated> {
        debug_assert!(
            !self.players.contains_key(&id),
            "player {} joined twice",
            id
        );

        let position = spawn::random_spawn(&self.grid, &self.players, self.spawn_margin)?;
        let record = self
            .identities
            .entry(id)
            .or_insert_with(|| IdentityRecord {
                color: random_color(),
                score: 0,
            });
        let color = record.color;
        self.players.insert(id, Player::new(id, position));
        Ok(color)
    }

    /// Drop the player entity for `id`, keeping its identity record.
    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Apply a validated steering input.
    ///
    /// Unknown ids, dead players, and reversal attempts are dropped
    /// without touching any state.
    pub fn set_direction(&mut self, id: u32, dir: Direction) {
        let player = match self.players.get_mut(&id) {
            Some(p) => p,
            None => {
                debug!("Steering from unknown player {}", id);
                return;
            }
        };
        if !player.alive {
            debug!("Steering from dead player {}", id);
            return;
        }
        if player.direction.reverses(dir) {
            debug!("Player {} reversal into own trail blocked", id);
            return;
        }
        player.direction = dir;
    }

    /// Advance every living, moving player one cell and resolve collisions.
    ///
    /// Candidate cells are computed from the pre-move roster before
    /// anything mutates. Entering a cell that held a head at the start of
    /// the tick is always lethal: if its owner stays it is a head-on
    /// crash, and if the owner moves away the cell becomes trail under
    /// the entering player. The owner dies too unless it moved off the
    /// cell successfully this same tick.
    pub fn advance(&mut self) -> Vec<Death> {
        // Phase 1: candidate cells.
        let mut moves: Vec<(u32, IVec2)> = Vec::new();
        for player in self.players.values() {
            if player.alive && player.direction != Direction::Stop {
                moves.push((player.id, self.grid.step(player.position, player.direction)));
            }
        }

        // Phase 2: movers that die on the border, a trail, a standing
        // head, or by contesting the same cell as another mover.
        let mut deaths: Vec<Death> = Vec::new();
        let mut dead: HashSet<u32> = HashSet::new();
        for &(id, next) in &moves {
            let cause = if !self.grid.in_bounds(next) {
                Some(DeathCause::Wall)
            } else if self.players.values().any(|p| p.trail.contains(&next)) {
                Some(DeathCause::Trail)
            } else if self.players.values().any(|p| p.id != id && p.position == next) {
                Some(DeathCause::HeadOn)
            } else if moves.iter().any(|&(other, cell)| other != id && cell == next) {
                Some(DeathCause::HeadOn)
            } else {
                None
            };
            if let Some(cause) = cause {
                dead.insert(id);
                deaths.push(Death { player_id: id, cause });
            }
        }

        // Phase 2b: a crash kills both parties. The owner of an entered
        // head cell survives only if its own move went through.
        for &(_, next) in &moves {
            let victim = self
                .players
                .values()
                .find(|p| p.alive && p.position == next);
            if let Some(victim) = victim {
                let vid = victim.id;
                let vacated =
                    !dead.contains(&vid) && moves.iter().any(|&(mover, _)| mover == vid);
                if !vacated && dead.insert(vid) {
                    deaths.push(Death {
                        player_id: vid,
                        cause: DeathCause::HeadOn,
                    });
                }
            }
        }

        // Phase 3: commit surviving moves, then freeze the dead in place.
        let max_len = self.max_trail_length;
        for &(id, next) in &moves {
            if dead.contains(&id) {
                continue;
            }
            if let Some(player) = self.players.get_mut(&id) {
                let old = player.position;
                player.extend_trail(old, max_len);
                player.position = next;
            }
        }
        for death in &deaths {
            if let Some(player) = self.players.get_mut(&death.player_id) {
                player.alive = false;
            }
        }

        deaths.sort_by_key(|d| d.player_id);
        deaths
    }

    /// Respawn every connected player for a fresh round.
    ///
    /// Trails are cleared first so stale segments do not block spawn
    /// points. On a saturated board the roster is left partially
    /// respawned and the caller retries next tick.
    pub fn respawn_all(&mut self) -> Result<(), GridSaturated> {
        for player in self.players.values_mut() {
            player.trail.clear();
            player.direction = Direction::Stop;
        }

        let ids: Vec<u32> = self.players.keys().copied().collect();
        for id in ids {
            let position = spawn::random_spawn(&self.grid, &self.players, self.spawn_margin)?;
            if let Some(player) = self.players.get_mut(&id) {
                player.respawn(position);
            }
        }
        Ok(())
    }

    pub fn roster_len(&self) -> usize {
        self.players.len()
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// The single surviving player, if exactly one is left.
    pub fn last_alive(&self) -> Option<u32> {
        let mut alive = self.players.values().filter(|p| p.alive);
        match (alive.next(), alive.next()) {
            (Some(player), None) => Some(player.id),
            _ => None,
        }
    }

    pub fn iter_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn identity(&self, id: u32) -> Option<&IdentityRecord> {
        self.identities.get(&id)
    }

    /// Credit `points` to the identity behind `id`.
    pub fn award_points(&mut self, id: u32, points: u32) {
        if let Some(record) = self.identities.get_mut(&id) {
            record.score += points;
        }
    }

    /// Score table over the currently connected players.
    pub fn score_table(&self) -> HashMap<u32, u32> {
        self.players
            .keys()
            .map(|&id| (id, self.identities.get(&id).map_or(0, |r| r.score)))
            .collect()
    }

    /// Color table over the currently connected players.
    pub fn color_table(&self) -> HashMap<u32, Color> {
        self.players
            .keys()
            .map(|&id| (id, self.identities.get(&id).map_or(Color::default(), |r| r.color)))
            .collect()
    }
}

/// Pick a display color with a random hue at full saturation.
fn random_color() -> Color {
    let mut rng = rand::rng();
    Color::from_hsl(rng.random_range(0.0..360.0), 1.0, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_arena() -> Arena {
        Arena::new(&GameConfig::default())
    }

    fn place(arena: &mut Arena, id: u32, pos: IVec2, dir: Direction) {
        arena.add_player(id).unwrap();
        let player = arena.players.get_mut(&id).unwrap();
        player.position = pos;
        player.direction = dir;
    }

    #[test]
    fn test_identity_survives_reconnect() {
        let mut arena = test_arena();
        let color = arena.add_player(1).unwrap();
        arena.award_points(1, 5);

        arena.remove_player(1);
        assert_eq!(arena.roster_len(), 0);

        let color_again = arena.add_player(1).unwrap();
        assert_eq!(color_again, color);
        assert_eq!(arena.identity(1).unwrap().score, 5);
    }

    #[test]
    fn test_steering_guards() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);

        // Unknown ids are ignored.
        arena.set_direction(99, Direction::Up);

        // Reversals are ignored, everything else sticks.
        arena.set_direction(1, Direction::Left);
        assert_eq!(arena.players[&1].direction, Direction::Right);
        arena.set_direction(1, Direction::Right);
        assert_eq!(arena.players[&1].direction, Direction::Right);
        arena.set_direction(1, Direction::Up);
        assert_eq!(arena.players[&1].direction, Direction::Up);

        // Dead players steer nothing.
        arena.players.get_mut(&1).unwrap().alive = false;
        arena.set_direction(1, Direction::Down);
        assert_eq!(arena.players[&1].direction, Direction::Up);
    }

    #[test]
    fn test_advance_moves_and_lays_trail() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);

        let deaths = arena.advance();
        assert!(deaths.is_empty());
        let player = &arena.players[&1];
        assert_eq!(player.position, IVec2::new(6, 5));
        assert_eq!(player.trail.back(), Some(&IVec2::new(5, 5)));
    }

    #[test]
    fn test_wall_death_freezes_player() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(29, 5), Direction::Right);

        let deaths = arena.advance();
        assert_eq!(
            deaths,
            vec![Death { player_id: 1, cause: DeathCause::Wall }]
        );
        let player = &arena.players[&1];
        assert!(!player.alive);
        assert_eq!(player.position, IVec2::new(29, 5));
        assert!(player.trail.is_empty());
    }

    #[test]
    fn test_trail_death() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(6, 4), Direction::Down);
        arena
            .players
            .get_mut(&1)
            .unwrap()
            .extend_trail(IVec2::new(6, 5), 300);

        let deaths = arena.advance();
        assert_eq!(
            deaths,
            vec![
                Death { player_id: 1, cause: DeathCause::Trail },
                Death { player_id: 2, cause: DeathCause::Trail },
            ]
        );
    }

    #[test]
    fn test_head_to_head_kills_both() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(7, 5), Direction::Left);

        // Both candidates are (6, 5).
        let deaths = arena.advance();
        assert_eq!(deaths.len(), 2);
        assert!(deaths.iter().all(|d| d.cause == DeathCause::HeadOn));
        assert!(!arena.players[&1].alive);
        assert!(!arena.players[&2].alive);
    }

    #[test]
    fn test_swap_kills_both() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(6, 5), Direction::Left);

        let deaths = arena.advance();
        assert_eq!(deaths.len(), 2);
        assert_eq!(arena.alive_count(), 0);
    }

    #[test]
    fn test_crash_into_stationary_head_kills_both() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(10, 5), Direction::Stop);

        for _ in 0..4 {
            assert!(arena.advance().is_empty());
        }
        assert_eq!(arena.players[&1].position, IVec2::new(9, 5));

        let deaths = arena.advance();
        assert_eq!(deaths.len(), 2);
        assert!(!arena.players[&1].alive);
        assert!(!arena.players[&2].alive);
        // The mover froze outside the cell it crashed into.
        assert_eq!(arena.players[&1].position, IVec2::new(9, 5));
        assert_eq!(arena.players[&2].position, IVec2::new(10, 5));
    }

    #[test]
    fn test_follower_dies_leader_escapes() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(6, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(5, 5), Direction::Right);

        let deaths = arena.advance();
        assert_eq!(
            deaths,
            vec![Death { player_id: 2, cause: DeathCause::HeadOn }]
        );
        assert!(arena.players[&1].alive);
        assert_eq!(arena.players[&1].position, IVec2::new(7, 5));
        assert!(!arena.players[&2].alive);
    }

    #[test]
    fn test_corpse_stays_lethal() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(29, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(26, 5), Direction::Right);

        // Player 1 dies on the border and freezes at (29, 5).
        let deaths = arena.advance();
        assert_eq!(deaths.len(), 1);

        // Player 2 walks into the corpse two ticks later.
        assert!(arena.advance().is_empty());
        let deaths = arena.advance();
        assert_eq!(
            deaths,
            vec![Death { player_id: 2, cause: DeathCause::HeadOn }]
        );
    }

    #[test]
    fn test_trail_cap_applies_during_advance() {
        let config = GameConfig {
            max_trail_length: 2,
            ..GameConfig::default()
        };
        let mut arena = Arena::new(&config);
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);

        for _ in 0..5 {
            arena.advance();
        }
        let player = &arena.players[&1];
        assert_eq!(player.position, IVec2::new(10, 5));
        assert_eq!(player.trail.len(), 2);
        assert_eq!(player.trail.front(), Some(&IVec2::new(8, 5)));
    }

    #[test]
    fn test_respawn_all_resets_roster() {
        let mut arena = test_arena();
        place(&mut arena, 1, IVec2::new(5, 5), Direction::Right);
        place(&mut arena, 2, IVec2::new(7, 5), Direction::Left);
        arena.advance();
        assert_eq!(arena.alive_count(), 0);

        arena.respawn_all().unwrap();
        assert_eq!(arena.alive_count(), 2);
        for player in arena.iter_players() {
            assert!(player.trail.is_empty());
            assert_eq!(player.direction, Direction::Stop);
            assert!(player.position.x >= 2 && player.position.x <= 27);
            assert!(player.position.y >= 2 && player.position.y <= 27);
        }
        assert_ne!(
            arena.players[&1].position,
            arena.players[&2].position
        );
    }
}
