//! Session orchestration.
//!
//! [`SyncController`] owns every piece of session state and reacts to four
//! kinds of events: a shard becoming ready, a server message, a user click and
//! the countdown tick. Handlers run one at a time and never block.

use crate::config::SyncConfig;
use crate::connection::{ConnectionSet, ShardTransport};
use crate::cooldown::{Clock, CooldownGate, CooldownState, CountdownDisplay, CountdownTick, SystemClock};
use crate::palette::{ColorCode, PaletteIndex};
use crate::protocol::{PixelInfo, ServerMessage, SessionToken, SnapshotPayload};
use crate::render::RenderSurface;
use crate::snapshot::{Cell, Coordinate, decode_full, decode_striped};
use crate::{Result, SyncError};

/// What happened to a user click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The write was handed to the shard owning the column.
    Sent { shard: usize },
    /// A cooldown is running; the click was dropped.
    CoolingDown,
    /// The click did not hit the canvas.
    OutsideCanvas,
}

/// What a server message changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Number of cells forwarded to the surface.
    Rendered { cells: usize },
    /// A server cooldown of `seconds` replaced the local one.
    CooldownApplied { seconds: u64 },
}

pub struct SyncController<T, S, D, C = SystemClock> {
    config: SyncConfig,
    palette: PaletteIndex,
    connections: ConnectionSet<T>,
    gate: CooldownGate<C>,
    surface: S,
    display: D,
    countdown_visible: bool,
}

impl<T, S, D> SyncController<T, S, D, SystemClock>
where
    T: ShardTransport,
    S: RenderSurface,
    D: CountdownDisplay,
{
    /// Create a controller running on the system clock.
    ///
    /// `transports` must be ordered like the configured shard addresses.
    pub fn new(config: SyncConfig, token: SessionToken, transports: Vec<T>, surface: S, display: D) -> Result<Self> {
        Self::with_clock(config, token, transports, surface, display, SystemClock)
    }
}

impl<T, S, D, C> SyncController<T, S, D, C>
where
    T: ShardTransport,
    S: RenderSurface,
    D: CountdownDisplay,
    C: Clock,
{
    pub fn with_clock(config: SyncConfig, token: SessionToken, transports: Vec<T>, surface: S, display: D, clock: C) -> Result<Self> {
        config.validate()?;
        if transports.len() != config.shard_count() {
            return Err(SyncError::Config(format!(
                "{} transports for {} configured shards",
                transports.len(),
                config.shard_count()
            )));
        }
        let palette = config.palette()?;
        let connections = ConnectionSet::new(transports, token)?;
        let gate = CooldownGate::new(config.cooldown(), clock);
        Ok(Self {
            config,
            palette,
            connections,
            gate,
            surface,
            display,
            countdown_visible: false,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn palette(&self) -> &PaletteIndex {
        &self.palette
    }

    pub fn connections(&self) -> &ConnectionSet<T> {
        &self.connections
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn cooldown_state(&self) -> CooldownState {
        self.gate.state()
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn on_connection_ready(&mut self, shard: usize) -> Result<()> {
        self.connections.on_ready(shard)
    }

    /// The connection of `shard` ended. Writes still held for it are dropped.
    pub fn on_connection_closed(&mut self, shard: usize) -> usize {
        let dropped = self.connections.on_closed(shard);
        if dropped > 0 {
            log::warn!("shard {shard}: connection ended, {dropped} held writes dropped");
        }
        dropped
    }

    /// Decode and apply one raw frame received on `shard`.
    ///
    /// A frame that fails to decode changes nothing.
    pub fn on_server_text(&mut self, shard: usize, text: &str) -> Result<MessageOutcome> {
        let message = self.connections.decode(shard, text)?;
        self.on_server_message(shard, message)
    }

    pub fn on_server_message(&mut self, shard: usize, message: ServerMessage) -> Result<MessageOutcome> {
        log::debug!("shard {shard}: {}", message.kind());
        match message {
            ServerMessage::PixelColor(pixel) => self.apply_pixel(pixel),
            ServerMessage::AllPixelsColors(payload) => self.apply_snapshot(shard, &payload),
            ServerMessage::CooldownInfo { seconds } => {
                log::info!("shard {shard}: server cooldown of {seconds}s");
                self.gate.force_waiting(seconds);
                Ok(MessageOutcome::CooldownApplied { seconds })
            }
        }
    }

    /// Paint `coordinate` with the palette color `color`.
    ///
    /// Clicks while a cooldown runs are dropped without error. A write that
    /// fails to send still costs the cooldown.
    pub fn on_user_click(&mut self, coordinate: Coordinate, color: &str) -> Result<ClickOutcome> {
        if !self.in_canvas(coordinate) {
            return Ok(ClickOutcome::OutsideCanvas);
        }
        let code = self.palette.color_to_code(color)?;
        if !self.gate.try_consume() {
            log::debug!("click at ({}, {}) dropped, cooldown running", coordinate.x, coordinate.y);
            return Ok(ClickOutcome::CoolingDown);
        }
        let shard = self.connections.send_write(coordinate, code)?;
        log::info!("setPixelColor(x={}, y={}, color={color}) -> shard {shard}", coordinate.x, coordinate.y);
        Ok(ClickOutcome::Sent { shard })
    }

    /// Click at a position in surface pixels.
    pub fn on_pointer_click(&mut self, px: f64, py: f64, color: &str) -> Result<ClickOutcome> {
        match self.config.pointer_mapping().to_coordinate(px, py) {
            Some(coordinate) => self.on_user_click(coordinate, color),
            None => Ok(ClickOutcome::OutsideCanvas),
        }
    }

    /// Advance the countdown display. Called at [`crate::cooldown::TICK_INTERVAL`].
    pub fn tick(&mut self) -> CountdownTick {
        let tick = self.gate.tick();
        match tick {
            CountdownTick::Counting { seconds_left, spinner } => {
                self.display.show(seconds_left, spinner);
                self.countdown_visible = true;
            }
            CountdownTick::Expired | CountdownTick::Inactive => {
                if self.countdown_visible {
                    self.display.clear();
                    self.countdown_visible = false;
                }
            }
        }
        tick
    }

    fn in_canvas(&self, coordinate: Coordinate) -> bool {
        coordinate.x < self.config.canvas_cols && coordinate.y < self.config.canvas_rows
    }

    fn apply_pixel(&mut self, pixel: PixelInfo) -> Result<MessageOutcome> {
        let coordinate = Coordinate::new(pixel.x, pixel.y);
        if !self.in_canvas(coordinate) {
            return Err(SyncError::Protocol(format!("pixel ({}, {}) is outside the canvas", pixel.x, pixel.y)));
        }
        let color = self.palette.code_to_color(pixel.color)?;
        self.surface.set_cell(coordinate, color);
        self.surface.flush();
        Ok(MessageOutcome::Rendered { cells: 1 })
    }

    fn apply_snapshot(&mut self, shard: usize, payload: &SnapshotPayload) -> Result<MessageOutcome> {
        let rows = self.config.canvas_rows;
        let cols = self.config.canvas_cols;
        let cells = match payload {
            SnapshotPayload::Full(codes) => decode_full(rows, cols, codes)?,
            SnapshotPayload::Striped(striped) => decode_striped(rows, cols, striped.stripe(), &striped.color_codes)?,
        };

        let mut rendered = 0;
        let mut first_bad: Option<ColorCode> = None;
        let mut skipped = 0;
        for Cell { coordinate, code } in cells {
            match self.palette.code_to_color(code) {
                Ok(color) => {
                    self.surface.set_cell(coordinate, color);
                    rendered += 1;
                }
                Err(_) => {
                    first_bad.get_or_insert(code);
                    skipped += 1;
                }
            }
        }
        self.surface.flush();

        if let Some(code) = first_bad {
            log::warn!("shard {shard}: snapshot had {skipped} cells with unknown color codes");
            return Err(SyncError::OutOfRange {
                code,
                palette_size: self.palette.len(),
            });
        }
        log::info!("shard {shard}: snapshot applied, {rendered} cells");
        Ok(MessageOutcome::Rendered { cells: rendered })
    }
}
