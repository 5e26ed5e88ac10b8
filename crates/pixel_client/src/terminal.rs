use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pixel_sync::{CanvasBuffer, ClickOutcome, Coordinate, CountdownDisplay, PaletteIndex, RenderSurface, SyncError};
use pixel_sync::client::{ErrorAction, SessionObserver};

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const UNPAINTED: char = '.';

/// Letter used for the palette color with `code`.
pub fn letter_for(code: usize) -> char {
    LETTERS.get(code).map_or('?', |&b| b as char)
}

pub fn palette_listing(palette: &PaletteIndex) -> String {
    palette
        .colors()
        .iter()
        .enumerate()
        .map(|(code, color)| format!("{} {code:>3} {color}\n", letter_for(code)))
        .collect()
}

/// Canvas printed to stdout with one letter per palette color.
pub struct TerminalCanvas {
    buffer: CanvasBuffer,
    palette: PaletteIndex,
    watch: bool,
    show_requested: Arc<AtomicBool>,
}

impl TerminalCanvas {
    /// With `watch` set the canvas is printed after every update, otherwise
    /// only on flushes that follow a raised `show_requested`.
    pub fn new(cols: u32, rows: u32, palette: PaletteIndex, watch: bool, show_requested: Arc<AtomicBool>) -> Self {
        Self {
            buffer: CanvasBuffer::new(cols, rows),
            palette,
            watch,
            show_requested,
        }
    }

    pub fn buffer(&self) -> &CanvasBuffer {
        &self.buffer
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.buffer.cols() as usize + 1) * self.buffer.rows() as usize);
        for y in 0..self.buffer.rows() {
            for x in 0..self.buffer.cols() {
                let ch = match self.buffer.get(x, y) {
                    Some(color) => self.palette.colors().iter().position(|c| c == color).map_or('?', letter_for),
                    None => UNPAINTED,
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

impl RenderSurface for TerminalCanvas {
    fn set_cell(&mut self, coordinate: Coordinate, color: &str) {
        self.buffer.set_cell(coordinate, color);
    }

    fn flush(&mut self) {
        if self.show_requested.swap(false, Ordering::SeqCst) || self.watch {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = stdout.write_all(self.render().as_bytes()).and_then(|()| stdout.flush()) {
                log::error!("Failed to print canvas: {err}");
            }
        }
    }
}

/// Countdown written to stderr on a single, rewritten line.
#[derive(Default)]
pub struct StderrCountdown {
    width: usize,
}

impl CountdownDisplay for StderrCountdown {
    fn show(&mut self, seconds_left: u64, spinner: char) {
        let text = format!("{spinner} cooldown {seconds_left}s");
        self.width = self.width.max(text.len());
        eprint!("\r{text:<width$}", width = self.width);
    }

    fn clear(&mut self) {
        eprint!("\r{:width$}\r", "", width = self.width);
        eprintln!("ready");
        self.width = 0;
    }
}

/// Reports click results on stderr.
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_error(&mut self, shard: Option<usize>, error: &SyncError) -> ErrorAction {
        match error {
            SyncError::UnknownColor(color) => eprintln!("unknown color '{color}' (try 'palette')"),
            SyncError::Connect { shard, reason } => {
                log::error!("shard {shard}: {reason}");
                eprintln!("could not connect to shard {shard}: {reason}");
            }
            SyncError::Disconnected { shard, reason } => {
                log::error!("shard {shard}: {reason}");
                eprintln!("lost connection to shard {shard}: {reason}");
            }
            other => match shard {
                Some(shard) => log::warn!("shard {shard}: {other}"),
                None => log::warn!("{other}"),
            },
        }
        ErrorAction::Continue
    }

    fn on_click(&mut self, outcome: ClickOutcome) {
        match outcome {
            ClickOutcome::Sent { shard } => eprintln!("sent to shard {shard}"),
            ClickOutcome::CoolingDown => eprintln!("cooldown running, wait for it to finish"),
            ClickOutcome::OutsideCanvas => eprintln!("outside of the canvas"),
        }
    }
}
