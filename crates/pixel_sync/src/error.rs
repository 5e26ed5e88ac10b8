use thiserror::Error;

use crate::palette::ColorCode;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the sync core.
///
/// None of these end a session on their own. The session observer decides
/// whether a connection should be dropped.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Unrecognized message kind, invalid JSON or missing fields.
    /// The message is dropped, the connection stays open.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Snapshot payload length does not match the canvas geometry.
    /// The whole snapshot is discarded.
    #[error("Malformed snapshot: expected {expected} color codes, got {found}")]
    MalformedSnapshot { expected: usize, found: usize },

    #[error("Invalid stripe descriptor: offset {offset}, stride {stride}")]
    InvalidStripe { offset: u32, stride: u32 },

    /// Color code outside the palette. Only the offending cell is skipped.
    #[error("Color code {code} out of range (palette has {palette_size} colors)")]
    OutOfRange { code: ColorCode, palette_size: usize },

    #[error("Unknown color: {0}")]
    UnknownColor(String),

    /// Sending on a shard failed. The cooldown already consumed is not refunded.
    #[error("Delivery to shard {shard} failed: {reason}")]
    Delivery { shard: usize, reason: String },

    #[error("Connection to shard {shard} failed: {reason}")]
    Connect { shard: usize, reason: String },

    /// An established connection failed while reading or sending.
    #[error("Connection to shard {shard} lost: {reason}")]
    Disconnected { shard: usize, reason: String },

    #[error("Unknown shard: {0}")]
    UnknownShard(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
