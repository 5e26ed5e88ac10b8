//! Integration tests for the pixel canvas sync core.

use std::cell::RefCell;
use std::rc::Rc;

pub use pixel_sync::{
    CanvasBuffer, Cell, ClickOutcome, Clock, ColorCode, ConnectionSet, Coordinate, CooldownGate, CooldownState, CountdownDisplay, CountdownTick, ManualClock,
    MessageOutcome, NoCountdownDisplay, PaletteIndex, RenderSurface, SessionToken, ShardTransport, StripeDescriptor, SyncConfig, SyncController, SyncError,
    decode_full, decode_striped, shard_for,
};
pub use serde_json::Value;

mod config;
mod cooldown;
mod palette;

/// Transport that records every frame. Clones share the record.
#[derive(Clone, Default)]
pub struct FakeTransport {
    pub sent: Rc<RefCell<Vec<String>>>,
    pub fail: Rc<RefCell<bool>>,
}

impl FakeTransport {
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent.borrow().iter().map(|s| serde_json::from_str(s).unwrap()).collect()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.borrow_mut() = fail;
    }
}

impl ShardTransport for FakeTransport {
    fn send_text(&mut self, text: String) -> std::result::Result<(), String> {
        if *self.fail.borrow() {
            return Err("socket closed".to_string());
        }
        self.sent.borrow_mut().push(text);
        Ok(())
    }
}

/// Countdown display that records every update.
#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Vec<(u64, char)>,
    pub clears: usize,
}

impl CountdownDisplay for RecordingDisplay {
    fn show(&mut self, seconds_left: u64, spinner: char) {
        self.shown.push((seconds_left, spinner));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

pub fn test_config(cols: u32, rows: u32, shards: usize) -> SyncConfig {
    SyncConfig {
        canvas_rows: rows,
        canvas_cols: cols,
        cooldown_seconds: 30,
        palette_colors: vec!["red".into(), "green".into(), "blue".into(), "white".into()],
        web_socket_app_addresses: (0..shards).map(|i| format!("ws://127.0.0.1:{}/", 9000 + i)).collect(),
        web_socket_app_addr: None,
        pixel_size: 10,
    }
}

pub type TestController = SyncController<FakeTransport, CanvasBuffer, RecordingDisplay, ManualClock>;

/// Controller over fake transports and a manual clock. No shard is ready yet.
pub fn test_controller(config: SyncConfig) -> (TestController, Vec<FakeTransport>, ManualClock) {
    let transports: Vec<FakeTransport> = (0..config.shard_count()).map(|_| FakeTransport::default()).collect();
    let clock = ManualClock::new();
    let surface = CanvasBuffer::new(config.canvas_cols, config.canvas_rows);
    let controller = SyncController::with_clock(
        config,
        SessionToken::new("token-1"),
        transports.clone(),
        surface,
        RecordingDisplay::default(),
        clock.clone(),
    )
    .unwrap();
    (controller, transports, clock)
}

/// Like [`test_controller`] with every shard ready and the `connectMe` frames cleared.
pub fn connected_controller(config: SyncConfig) -> (TestController, Vec<FakeTransport>, ManualClock) {
    let (mut controller, transports, clock) = test_controller(config);
    for shard in 0..transports.len() {
        controller.on_connection_ready(shard).unwrap();
    }
    for transport in &transports {
        transport.sent.borrow_mut().clear();
    }
    (controller, transports, clock)
}
