//! WebSocket wire protocol.
//!
//! Every frame is a JSON text message. Client requests carry a `method`
//! discriminator plus the session token, server messages carry a `kind`
//! discriminator and a `data` payload.
//!
//! Colors are sent as palette codes. Older servers accepted color names in
//! `setPixelColor`; that form is not produced here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::palette::ColorCode;
use crate::snapshot::StripeDescriptor;
use crate::{Result, SyncError};

pub const METHOD_CONNECT_ME: &str = "connectMe";
pub const METHOD_SET_PIXEL_COLOR: &str = "setPixelColor";

pub const KIND_PIXEL_COLOR: &str = "pixelColor";
pub const KIND_ALL_PIXELS_COLORS: &str = "allPixelsColors";
pub const KIND_COOLDOWN_INFO: &str = "cooldownInfo";

/// Opaque credential attached to every request. Never inspected by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Sent once per connection as soon as it is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectMeRequest {
    pub method: String,
    pub session_token: SessionToken,
}

impl ConnectMeRequest {
    pub fn new(session_token: SessionToken) -> Self {
        Self {
            method: METHOD_CONNECT_ME.to_string(),
            session_token,
        }
    }
}

/// Pixel coordinates plus color code, shared by requests and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelInfo {
    pub x: u32,
    pub y: u32,
    pub color: ColorCode,
}

/// Paint one pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPixelColorRequest {
    pub method: String,
    pub session_token: SessionToken,
    pub args: PixelInfo,
}

impl SetPixelColorRequest {
    pub fn new(session_token: SessionToken, x: u32, y: u32, color: ColorCode) -> Self {
        Self {
            method: METHOD_SET_PIXEL_COLOR.to_string(),
            session_token,
            args: PixelInfo { x, y, color },
        }
    }
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Striped snapshot payload: only the columns of one shard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripedSnapshot {
    pub color_codes: Vec<ColorCode>,
    pub offset: u32,
    pub each_nth: u32,
}

impl StripedSnapshot {
    pub fn stripe(&self) -> StripeDescriptor {
        StripeDescriptor {
            offset: self.offset,
            stride: self.each_nth,
        }
    }
}

/// `allPixelsColors` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotPayload {
    Striped(StripedSnapshot),
    /// Row-major codes for the whole canvas.
    Full(Vec<ColorCode>),
}

/// Generic envelope used to read the discriminator first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Parsed server message.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    PixelColor(PixelInfo),
    AllPixelsColors(SnapshotPayload),
    CooldownInfo { seconds: u64 },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::PixelColor(_) => KIND_PIXEL_COLOR,
            ServerMessage::AllPixelsColors(_) => KIND_ALL_PIXELS_COLORS,
            ServerMessage::CooldownInfo { .. } => KIND_COOLDOWN_INFO,
        }
    }
}

/// Parse one JSON text frame from the server.
///
/// # Errors
///
/// Any frame that is not valid JSON, has an unknown `kind` or a payload of the
/// wrong shape yields [`SyncError::Protocol`].
pub fn parse_server_message(json: &str) -> Result<ServerMessage> {
    let IncomingMessage { kind, data } =
        serde_json::from_str(json).map_err(|e| SyncError::Protocol(format!("invalid message: {e}")))?;

    match kind.as_str() {
        KIND_PIXEL_COLOR => payload(&kind, data).map(ServerMessage::PixelColor),
        KIND_ALL_PIXELS_COLORS => payload(&kind, data).map(ServerMessage::AllPixelsColors),
        KIND_COOLDOWN_INFO => payload(&kind, data).map(|seconds| ServerMessage::CooldownInfo { seconds }),
        other => Err(SyncError::Protocol(format!("unknown message kind '{other}'"))),
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| SyncError::Protocol(format!("bad '{kind}' payload: {e}")))
}
