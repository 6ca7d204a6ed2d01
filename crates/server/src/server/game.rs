//! Game state and main loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use protocol::messages::{ClientMessage, PlayerState, RoundOutcome, WorldState};
use protocol::{Color, Direction};

use crate::arena::Arena;
use crate::config::Config;
use crate::round::{RoundController, RoundPhase};
use crate::spawn::GridSaturated;

use super::DeathNotice;

/// Why a join was refused.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("server is full ({0} players connected)")]
    ServerFull(usize),
    #[error(transparent)]
    GridSaturated(#[from] GridSaturated),
}

/// Broadcasts collected during a tick, sent after the state lock is
/// released.
pub struct PendingBroadcasts {
    pub deaths: Vec<DeathNotice>,
    pub round_over: Option<RoundOutcome>,
    pub state: WorldState,
}

/// Main game state. Everything mutable lives behind one `RwLock`.
pub struct GameState {
    pub config: Config,
    pub tick_count: u64,
    pub arena: Arena,
    pub round: RoundController,

    /// ID counter
    next_player_id: u32,

    /// Set once the first connection has spawned the loop task.
    pub loop_started: bool,

    // Broadcast channels
    state_tx: broadcast::Sender<WorldState>,
    death_tx: broadcast::Sender<DeathNotice>,
    round_tx: broadcast::Sender<RoundOutcome>,

    /// Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    pub fn new(
        config: &Config,
        state_tx: broadcast::Sender<WorldState>,
        death_tx: broadcast::Sender<DeathNotice>,
        round_tx: broadcast::Sender<RoundOutcome>,
    ) -> Self {
        Self {
            config: config.clone(),
            tick_count: 0,
            arena: Arena::new(&config.game),
            round: RoundController::new(
                config.round.cooldown_secs,
                config.server.tick_interval_ms,
            ),
            next_player_id: 1,
            loop_started: false,
            state_tx,
            death_tx,
            round_tx,
            update_time_avg: 0.0,
        }
    }

    /// Add a new player, refusing when the roster or the board is full.
    pub fn add_player(&mut self, addr: SocketAddr) -> Result<(u32, Color), JoinError> {
        if self.arena.roster_len() >= self.config.server.max_players {
            return Err(JoinError::ServerFull(self.arena.roster_len()));
        }

        let id = self.next_player_id;
        let color = self.arena.add_player(id)?;
        self.next_player_id += 1;
        info!("Player {} connected from {}", id, addr);
        Ok((id, color))
    }

    /// Remove a player, keeping its identity for a later reconnect.
    pub fn remove_player(&mut self, id: u32) {
        if self.arena.remove_player(id).is_some() {
            info!("Player {} disconnected", id);
        }
    }

    /// Handle one text frame from a client. Malformed input and stale
    /// ids are logged and dropped, never answered.
    pub fn handle_message(&mut self, player_id: u32, text: &str) {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Player {} sent malformed message: {}", player_id, e);
                return;
            }
        };

        match msg {
            ClientMessage::ChangeDirection { dx, dy } => {
                let dir = match Direction::try_from((dx, dy)) {
                    Ok(dir) => dir,
                    Err(e) => {
                        warn!("Player {}: {}", player_id, e);
                        return;
                    }
                };
                if self.round.phase != RoundPhase::Active {
                    debug!("Player {} steering ignored between rounds", player_id);
                    return;
                }
                self.arena.set_direction(player_id, dir);
            }
        }
    }

    /// Run a single game tick and collect the pending broadcasts.
    pub fn tick(&mut self) -> PendingBroadcasts {
        self.tick_count += 1;

        let (deaths, round_over) = self.round.on_tick(&mut self.arena, self.tick_count);

        PendingBroadcasts {
            deaths: deaths
                .into_iter()
                .map(|d| DeathNotice {
                    player_id: d.player_id,
                    cause: d.cause,
                })
                .collect(),
            round_over,
            state: self.snapshot(),
        }
    }

    /// Assemble the per-tick world snapshot.
    fn snapshot(&self) -> WorldState {
        let mut players: Vec<PlayerState> = self
            .arena
            .iter_players()
            .map(|p| PlayerState {
                id: p.id,
                pos: p.position,
                dir: p.direction,
                color: self.arena.identity(p.id).map_or(Color::default(), |r| r.color),
                trail: p.trail.iter().copied().collect(),
                alive: p.alive,
            })
            .collect();
        players.sort_by_key(|p| p.id);

        WorldState {
            round_active: self.round.phase == RoundPhase::Active,
            players,
        }
    }
}

/// Run the main game loop.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64) {
    let period = Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    // Use Skip to catch up on missed ticks - ensures consistent game speed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let scheduled = ticker.tick().await;

        // Back off while nobody is connected to keep the idle server cheap.
        {
            let game = state.read().await;
            if game.arena.roster_len() == 0 {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                continue;
            }
        }

        // Drain any backlog of tick events so we always process the most recent tick.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let broadcasts = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let broadcasts = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_interval_ms as f64 * 0.9;
            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    game.arena.roster_len()
                );
            }

            broadcasts
        };

        let (state_tx, death_tx, round_tx) = {
            let game = state.read().await;
            (
                game.state_tx.clone(),
                game.death_tx.clone(),
                game.round_tx.clone(),
            )
        };

        // Deaths and the outcome go out before the snapshot that already
        // reflects them.
        for death in broadcasts.deaths {
            let _ = death_tx.send(death);
        }
        if let Some(outcome) = broadcasts.round_over {
            let _ = round_tx.send(outcome);
        }
        let _ = state_tx.send(broadcasts.state);
    }
}
