//! Client-side synchronization for a shared, sharded pixel canvas.
//!
//! Participants paint single cells of a fixed size canvas. Every write is
//! rate-limited by a per-participant cooldown, routed to the server shard that
//! owns the column, and broadcast back to everybody as a pixel update. On
//! connect each shard sends a snapshot of its columns.
//!
//! The crate is split into pure pieces ([`palette`], [`cooldown`],
//! [`snapshot`], [`protocol`], [`connection`]) that are tied together by
//! [`controller::SyncController`]. The optional `client` feature adds a Tokio
//! WebSocket runtime in [`client`].

pub mod config;
pub mod connection;
pub mod controller;
pub mod cooldown;
mod error;
pub mod palette;
pub mod protocol;
pub mod render;
pub mod snapshot;

#[cfg(feature = "client")]
pub mod client;

pub use config::SyncConfig;
pub use connection::{ConnectionSet, ShardTransport, shard_for};
pub use controller::{ClickOutcome, MessageOutcome, SyncController};
pub use cooldown::{Clock, CooldownGate, CooldownState, CountdownDisplay, CountdownTick, ManualClock, NoCountdownDisplay, SystemClock};
pub use error::{Result, SyncError};
pub use palette::{ColorCode, PaletteIndex};
pub use protocol::{ServerMessage, SessionToken, parse_server_message};
pub use render::{CanvasBuffer, PointerMapping, RenderSurface};
pub use snapshot::{Cell, Coordinate, StripeDescriptor, decode_full, decode_striped};
