//! Shared protocol crate for the gridrun game.
//!
//! This crate contains:
//! - Client/server message definitions (JSON over WebSocket)
//! - Validated movement directions
//! - Shared types (Color, Cell, etc.)

mod direction;
mod error;
pub mod messages;

pub use direction::Direction;
pub use error::ProtocolError;

use serde::{Deserialize, Serialize};

/// A cell coordinate on the grid.
pub type Cell = glam::IVec2;

/// RGB color, carried on the wire as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert from HSL. Hue in degrees, saturation and lightness in `[0, 1]`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self {
            r: ((r1 + m) * 255.0).round() as u8,
            g: ((g1 + m) * 255.0).round() as u8,
            b: ((b1 + m) * 255.0).round() as u8,
        }
    }

    /// The `#rrggbb` form used on the wire and by the web client.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| ProtocolError::InvalidColor(value.clone()))?;
        if hex.len() != 6 {
            return Err(ProtocolError::InvalidColor(value.clone()));
        }
        let parse = |range| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ProtocolError::InvalidColor(value.clone()))
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }
}
