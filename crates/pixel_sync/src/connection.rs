//! Shard routing over a fixed set of connections.
//!
//! The canvas is split by column: shard `x % count` owns column `x`. A single
//! connection is just the `count == 1` case of the same rule.

use crate::palette::ColorCode;
use crate::protocol::{ConnectMeRequest, ServerMessage, SessionToken, SetPixelColorRequest, parse_server_message};
use crate::snapshot::Coordinate;
use crate::{Result, SyncError};

/// Index of the shard that owns column `x`.
///
/// `count` must be at least 1.
pub fn shard_for(x: u32, count: usize) -> usize {
    (x as u64 % count as u64) as usize
}

/// Outgoing half of one shard connection.
pub trait ShardTransport {
    /// Queue one text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when the frame cannot be delivered.
    fn send_text(&mut self, text: String) -> std::result::Result<(), String>;
}

struct Shard<T> {
    transport: T,
    connect_sent: bool,
    closed: bool,
    /// Writes issued before `connectMe`, in issue order.
    pending: Vec<String>,
}

/// The ordered connections of one session, one per shard.
pub struct ConnectionSet<T> {
    shards: Vec<Shard<T>>,
    token: SessionToken,
}

impl<T: ShardTransport> ConnectionSet<T> {
    /// # Errors
    ///
    /// [`SyncError::Config`] when `transports` is empty.
    pub fn new(transports: Vec<T>, token: SessionToken) -> Result<Self> {
        if transports.is_empty() {
            return Err(SyncError::Config("at least one shard connection is required".to_string()));
        }
        let shards = transports
            .into_iter()
            .map(|transport| Shard {
                transport,
                connect_sent: false,
                closed: false,
                pending: Vec::new(),
            })
            .collect();
        Ok(Self { shards, token })
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn shard_for(&self, x: u32) -> usize {
        shard_for(x, self.shards.len())
    }

    /// Writes held back until their shard is ready.
    pub fn pending_writes(&self) -> usize {
        self.shards.iter().map(|s| s.pending.len()).sum()
    }

    /// Whether `connectMe` went out on `shard`.
    pub fn is_connected(&self, shard: usize) -> bool {
        self.shards.get(shard).is_some_and(|s| s.connect_sent)
    }

    /// Announce the session on a shard that just became ready.
    ///
    /// Only the first readiness signal of a shard sends `connectMe`. Writes held
    /// for the shard follow it in issue order.
    pub fn on_ready(&mut self, shard: usize) -> Result<()> {
        let token = self.token.clone();
        let entry = self.shards.get_mut(shard).ok_or(SyncError::UnknownShard(shard))?;
        if entry.connect_sent {
            log::warn!("shard {shard} reported ready twice, connectMe already sent");
            return Ok(());
        }
        entry.connect_sent = true;

        let msg = to_json(&ConnectMeRequest::new(token), shard)?;
        entry.transport.send_text(msg).map_err(|reason| SyncError::Delivery { shard, reason })?;
        log::info!("shard {shard}: connectMe sent");

        let pending = std::mem::take(&mut entry.pending);
        if !pending.is_empty() {
            log::debug!("shard {shard}: sending {} held writes", pending.len());
        }
        for msg in pending {
            entry.transport.send_text(msg).map_err(|reason| SyncError::Delivery { shard, reason })?;
        }
        Ok(())
    }

    /// Mark the connection of `shard` as ended and forget its held writes.
    ///
    /// Returns how many held writes were dropped. Later writes to the shard fail
    /// with [`SyncError::Delivery`].
    pub fn on_closed(&mut self, shard: usize) -> usize {
        match self.shards.get_mut(shard) {
            Some(entry) => {
                entry.closed = true;
                std::mem::take(&mut entry.pending).len()
            }
            None => 0,
        }
    }

    /// Send a pixel write to the shard owning `coordinate.x`.
    ///
    /// Returns the shard the write was routed to. Until that shard is ready the
    /// write is held and goes out right after `connectMe`.
    pub fn send_write(&mut self, coordinate: Coordinate, code: ColorCode) -> Result<usize> {
        let shard = self.shard_for(coordinate.x);
        let request = SetPixelColorRequest::new(self.token.clone(), coordinate.x, coordinate.y, code);
        let msg = to_json(&request, shard)?;
        let entry = self.shards.get_mut(shard).ok_or(SyncError::UnknownShard(shard))?;
        if entry.closed {
            return Err(SyncError::Delivery {
                shard,
                reason: "connection closed".to_string(),
            });
        }
        if !entry.connect_sent {
            entry.pending.push(msg);
            return Ok(shard);
        }
        entry.transport.send_text(msg).map_err(|reason| {
            log::error!("Failed to send setPixelColor to shard {shard}: {reason}");
            SyncError::Delivery { shard, reason }
        })?;
        Ok(shard)
    }

    /// Decode one inbound frame of `shard`.
    pub fn decode(&self, shard: usize, text: &str) -> Result<ServerMessage> {
        if shard >= self.shards.len() {
            return Err(SyncError::UnknownShard(shard));
        }
        parse_server_message(text)
    }
}

fn to_json<M: serde::Serialize>(msg: &M, shard: usize) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| SyncError::Delivery {
        shard,
        reason: e.to_string(),
    })
}
