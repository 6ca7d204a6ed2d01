//! gridrun - Unified game server with embedded web client.
//!
//! Serves the browser client over HTTP and runs the game WebSocket on
//! the same port, so a single binary is enough to host a match.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use protocol::messages::{RoundOutcome, ServerMessage, WorldState};
use server::server::game::{run_game_loop, GameState};
use server::{Config, DeathNotice};

// Embedded static assets for the browser client
#[derive(RustEmbed)]
#[folder = "web/"]
struct Assets;

#[derive(Clone)]
struct AppState {
    game_state: Arc<RwLock<GameState>>,
    state_tx: broadcast::Sender<WorldState>,
    death_tx: broadcast::Sender<DeathNotice>,
    round_tx: broadcast::Sender<RoundOutcome>,
    tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug")),
        )
        .init();

    info!("gridrun v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!(
        "  Grid: {}x{} cells",
        config.game.grid_size, config.game.grid_size
    );
    info!("  Tick: {}ms", config.server.tick_interval_ms);

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

    let state = AppState {
        game_state,
        state_tx,
        death_tx,
        round_tx,
        tick_interval_ms: config.server.tick_interval_ms,
    };

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/", get(serve_index))
        .route("/index.html", get(serve_index))
        .fallback(static_handler)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Game WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("WebSocket connection from {}", addr);

    // The first connection starts the engine, exactly once.
    {
        let mut game = state.game_state.write().await;
        if !game.loop_started {
            game.loop_started = true;
            info!("Starting game loop at {}ms per tick", state.tick_interval_ms);
            let loop_state = Arc::clone(&state.game_state);
            let tick_interval = state.tick_interval_ms;
            tokio::spawn(async move {
                run_game_loop(loop_state, tick_interval).await;
            });
        }
    }

    ws.on_upgrade(move |socket| handle_websocket(socket, addr, state))
}

async fn handle_websocket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let state_rx = state.state_tx.subscribe();
    let death_rx = state.death_tx.subscribe();
    let round_rx = state.round_tx.subscribe();

    if let Err(e) = handle_game_connection(
        socket,
        addr,
        state.game_state,
        state_rx,
        death_rx,
        round_rx,
    )
    .await
    {
        error!("Connection error from {}: {}", addr, e);
    }
}

/// Handle a single game WebSocket connection.
async fn handle_game_connection(
    socket: WebSocket,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut state_rx: broadcast::Receiver<WorldState>,
    mut death_rx: broadcast::Receiver<DeathNotice>,
    mut round_rx: broadcast::Receiver<RoundOutcome>,
) -> anyhow::Result<()> {
    let (mut write, mut read) = socket.split();

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
    write: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    write.send(Message::Text(json.into())).await?;
    Ok(())
}

async fn serve_index() -> impl IntoResponse {
    serve_static_file("index.html").await
}

async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');
    serve_static_file(path).await
}

async fn serve_static_file(path: &str) -> Response {
    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            Response::builder()
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(content.data.into())
                .unwrap()
        }
        None => {
            warn!("Static file not found: {}", path);
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body("404 Not Found".into())
                .unwrap()
        }
    }
}
