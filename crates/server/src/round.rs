//! Round lifecycle.
//!
//! A round runs until at most one contender is left alive, pays the
//! survivor, freezes the board for a cooldown, and then respawns the
//! whole roster for the next one. Durations are derived from the tick
//! counter so scoring does not depend on wall-clock jitter.

use tracing::{info, warn};

use protocol::messages::RoundOutcome;

use crate::arena::{Arena, Death};

/// Seconds of round time per extra point for the winner.
const BONUS_INTERVAL_SECS: u64 = 10;

/// Round phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Movement and collisions are live.
    Active,
    /// Frozen between rounds, waiting out the cooldown.
    Ended,
}

/// Drives the round state machine one tick at a time.
#[derive(Debug)]
pub struct RoundController {
    pub phase: RoundPhase,
    /// Tick the running round started on.
    started_tick: u64,
    /// Ticks spent in `Ended` so far.
    cooldown_timer: u64,
    /// Cooldown length in ticks.
    cooldown_ticks: u64,
    /// Tick period, for converting tick counts to seconds.
    tick_interval_ms: u64,
}

impl RoundController {
    pub fn new(cooldown_secs: u64, tick_interval_ms: u64) -> Self {
        let tick_interval_ms = tick_interval_ms.max(1);
        Self {
            phase: RoundPhase::Active,
            started_tick: 0,
            cooldown_timer: 0,
            cooldown_ticks: cooldown_secs * 1000 / tick_interval_ms,
            tick_interval_ms,
        }
    }

    /// Length of the running round in whole seconds as of `tick`.
    fn duration_secs(&self, tick: u64) -> u64 {
        tick.saturating_sub(self.started_tick) * self.tick_interval_ms / 1000
    }

    /// Advance one tick.
    ///
    /// While `Active` this moves the arena and checks whether the round
    /// is decided; a solo roster never ends a round, it just keeps
    /// practicing. While `Ended` it runs down the cooldown and respawns
    /// everyone, retrying next tick if the board has no room.
    pub fn on_tick(&mut self, arena: &mut Arena, tick: u64) -> (Vec<Death>, Option<RoundOutcome>) {
        match self.phase {
            RoundPhase::Active => {
                let deaths = arena.advance();

                if arena.roster_len() < 2 || arena.alive_count() > 1 {
                    return (deaths, None);
                }

                let duration = self.duration_secs(tick);
                let winner = arena.last_alive();
                let award = match winner {
                    Some(id) => {
                        let points = 1 + (duration / BONUS_INTERVAL_SECS) as u32;
                        arena.award_points(id, points);
                        info!(
                            "Round over after {}s, player {} wins {} points",
                            duration, id, points
                        );
                        points
                    }
                    None => {
                        info!("Round over after {}s with no survivors", duration);
                        0
                    }
                };

                self.phase = RoundPhase::Ended;
                self.cooldown_timer = 0;

                let outcome = RoundOutcome {
                    winner,
                    duration_secs: duration,
                    award,
                    scores: arena.score_table(),
                    colors: arena.color_table(),
                };
                (deaths, Some(outcome))
            }
            RoundPhase::Ended => {
                self.cooldown_timer += 1;
                if self.cooldown_timer >= self.cooldown_ticks {
                    match arena.respawn_all() {
                        Ok(()) => {
                            self.phase = RoundPhase::Active;
                            self.started_tick = tick;
                            info!("New round started with {} players", arena.roster_len());
                        }
                        Err(e) => {
                            warn!("Respawn failed, retrying next tick: {}", e);
                        }
                    }
                }
                (Vec::new(), None)
            }
        }
    }
}
