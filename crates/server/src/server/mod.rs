//! Game server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{error, info, warn};

use protocol::messages::{DeathCause, RoundOutcome, ServerMessage, WorldState};

use crate::config::Config;

pub mod game;

pub use game::{run_game_loop, GameState};

/// A death to announce to every client.
#[derive(Debug, Clone, Copy)]
pub struct DeathNotice {
    /// Player that collided.
    pub player_id: u32,
    /// What they hit.
    pub cause: DeathCause,
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    // Broadcast channels for snapshots, deaths, and round results.
    let (state_tx, _) = broadcast::channel::<WorldState>(8);
    let (death_tx, _) = broadcast::channel::<DeathNotice>(64);
    let (round_tx, _) = broadcast::channel::<RoundOutcome>(8);

    // Shared game state; the loop task starts with the first connection.
    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        state_tx.clone(),
        death_tx.clone(),
        round_tx.clone(),
    )));

    let tick_interval = config.server.tick_interval_ms;

    loop {
        let (stream, peer) = listener.accept().await?;

        // The first connection starts the engine, exactly once.
        {
            let mut game = game_state.write().await;
            if !game.loop_started {
                game.loop_started = true;
                info!("Starting game loop at {}ms per tick", tick_interval);
                let loop_state = Arc::clone(&game_state);
                tokio::spawn(async move {
                    game::run_game_loop(loop_state, tick_interval).await;
                });
            }
        }

        let game_state = Arc::clone(&game_state);
        let state_rx = state_tx.subscribe();
        let death_rx = death_tx.subscribe();
        let round_rx = round_tx.subscribe();

        tokio::spawn(async move {
            if let Err(e) =
                handle_connection(stream, peer, game_state, state_rx, death_rx, round_rx).await
            {
                error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut state_rx: broadcast::Receiver<WorldState>,
    mut death_rx: broadcast::Receiver<DeathNotice>,
    mut round_rx: broadcast::Receiver<RoundOutcome>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Join the arena; a full roster or a packed board refuses the socket.
    let (player_id, color, grid_size) = {
        let mut state = game_state.write().await;
        match state.add_player(addr) {
            Ok((id, color)) => (id, color, state.config.game.grid_size),
            Err(e) => {
                warn!("Refusing connection from {}: {}", addr, e);
                return Ok(());
            }
        }
    };

    // Greet the client with its identity and the board dimensions.
    let welcome = ServerMessage::Welcome {
        player_id,
        color,
        grid_size,
    };
    send_message(&mut write, &welcome).await?;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let mut state = game_state.write().await;
                        state.handle_message(player_id, &text);
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            world = state_rx.recv() => {
                if let Ok(world) = world {
                    if let Err(e) = send_message(&mut write, &ServerMessage::State(world)).await {
                        warn!("Failed to send snapshot to {}: {}", addr, e);
                        break;
                    }
                }
            }
            death = death_rx.recv() => {
                if let Ok(death) = death {
                    let msg = ServerMessage::Death {
                        player_id: death.player_id,
                        cause: death.cause,
                    };
                    if let Err(e) = send_message(&mut write, &msg).await {
                        warn!("Failed to send death notice to {}: {}", addr, e);
                        break;
                    }
                }
            }
            outcome = round_rx.recv() => {
                if let Ok(outcome) = outcome {
                    if let Err(e) = send_message(&mut write, &ServerMessage::RoundOver(outcome)).await {
                        warn!("Failed to send round result to {}: {}", addr, e);
                        break;
                    }
                }
            }
        }
    }

    // Drop the player entity; the identity record stays behind.
    {
        let mut state = game_state.write().await;
        state.remove_player(player_id);
    }

    Ok(())
}

async fn send_message(
    write: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    msg: &ServerMessage,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    write.send(Message::Text(json.into())).await?;
    Ok(())
}
