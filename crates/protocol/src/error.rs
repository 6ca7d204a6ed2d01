//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while validating client input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid direction vector ({dx}, {dy})")]
    InvalidDirection { dx: i32, dy: i32 },

    #[error("Invalid color string: {0:?}")]
    InvalidColor(String),
}
