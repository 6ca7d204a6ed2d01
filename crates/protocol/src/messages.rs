//! Wire messages exchanged with clients.
//!
//! Everything travels as JSON text frames over the WebSocket, tagged
//! with `t` and carrying the payload under `data`. Inbound vectors are
//! raw integers so validation stays on the server side.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Cell, Color, Direction};

/// Messages sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Steering input as a raw `(dx, dy)` vector.
    ChangeDirection { dx: i32, dy: i32 },
}

/// Messages sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message after the upgrade: assigned id, color, and board size.
    Welcome {
        player_id: u32,
        color: Color,
        grid_size: i32,
    },
    /// Per-tick snapshot of the whole arena.
    State(WorldState),
    /// A player collided this tick.
    Death { player_id: u32, cause: DeathCause },
    /// The round just ended.
    RoundOver(RoundOutcome),
}

/// What a player collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Ran off the edge of the grid.
    Wall,
    /// Hit a light trail.
    Trail,
    /// Crashed into another player's head.
    HeadOn,
}

/// Snapshot of one player within a [`WorldState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    pub pos: Cell,
    pub dir: Direction,
    pub color: Color,
    /// Trail cells, oldest first.
    pub trail: Vec<Cell>,
    pub alive: bool,
}

/// Per-tick snapshot of the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// False while the between-round cooldown is running.
    pub round_active: bool,
    pub players: Vec<PlayerState>,
}

/// End-of-round result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Winning player id, or `None` when nobody survived.
    pub winner: Option<u32>,
    /// Round length in whole seconds.
    pub duration_secs: u64,
    /// Points the winner earned, zero on a draw.
    pub award: u32,
    /// Score table for the connected players.
    pub scores: HashMap<u32, u32>,
    /// Color table for the connected players.
    pub colors: HashMap<u32, Color>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_direction_wire_shape() {
        let json = r#"{"t":"change_direction","data":{"dx":1,"dy":0}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        let ClientMessage::ChangeDirection { dx, dy } = msg;
        assert_eq!((dx, dy), (1, 0));
    }

    #[test]
    fn test_welcome_wire_shape() {
        let msg = ServerMessage::Welcome {
            player_id: 3,
            color: Color::new(0, 255, 204),
            grid_size: 30,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r##"{"t":"welcome","data":{"player_id":3,"color":"#00ffcc","grid_size":30}}"##
        );
    }

    #[test]
    fn test_draw_outcome_has_null_winner() {
        let outcome = RoundOutcome {
            winner: None,
            duration_secs: 4,
            award: 0,
            scores: HashMap::new(),
            colors: HashMap::new(),
        };
        let json = serde_json::to_string(&ServerMessage::RoundOver(outcome)).unwrap();
        assert!(json.contains(r#""winner":null"#));
        assert!(json.contains(r#""t":"round_over""#));
    }

    #[test]
    fn test_cells_serialize_as_pairs() {
        let state = PlayerState {
            id: 1,
            pos: Cell::new(5, 7),
            dir: Direction::Right,
            color: Color::new(255, 0, 0),
            trail: vec![Cell::new(3, 7), Cell::new(4, 7)],
            alive: true,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""pos":[5,7]"#));
        assert!(json.contains(r#""dir":"right""#));
        assert!(json.contains(r#""trail":[[3,7],[4,7]]"#));
    }
}
