#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]

mod commands;
mod terminal;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use pixel_sync::client::{SessionCommand, run_session};
use pixel_sync::{Coordinate, PaletteIndex, SessionToken, SyncConfig};
use tokio::sync::mpsc;

use commands::{Command, HELP, parse_command};
use terminal::{ConsoleObserver, StderrCountdown, TerminalCanvas, palette_listing};

#[derive(Parser, Debug)]
#[command(version, about = "Paint on a shared pixel canvas from the terminal", long_about = None)]
pub struct Args {
    /// Canvas configuration (.json or .toml)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Session token sent with every request
    #[arg(long, env = "PIXEL_SESSION_TOKEN")]
    token: String,

    /// Print the canvas after every update
    #[clap(long, default_value_t = false)]
    watch: bool,

    /// Log filter, e.g. "debug" or "info,pixel_sync=trace"
    #[clap(long, value_name = "SPEC", default_value = "info")]
    log: String,
}

fn get_log_dir() -> Option<PathBuf> {
    if let Some(proj_dirs) = directories::ProjectDirs::from("com", "GitHub", "pixel_client") {
        let dir = proj_dirs.data_local_dir().to_path_buf();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).ok()?;
        }
        return Some(dir);
    }
    None
}

fn start_logger(spec: &str) -> Option<LoggerHandle> {
    let Some(log_dir) = get_log_dir() else {
        eprintln!("Failed to create log directory");
        return None;
    };
    let logger = Logger::try_with_env_or_str(spec)
        .and_then(|logger| {
            logger
                .log_to_file(FileSpec::default().directory(&log_dir).basename("pixel_client").suffix("log").suppress_timestamp())
                .rotate(Criterion::Size(64 * 1024), Naming::Numbers, Cleanup::KeepLogFiles(3))
                .duplicate_to_stderr(flexi_logger::Duplicate::Warn)
                .start()
        });
    match logger {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("Failed to start logger: {err}");
            None
        }
    }
}

/// Read stdin until EOF or `quit`, forwarding commands to the session.
fn read_commands(commands: mpsc::Sender<SessionCommand>, palette: PaletteIndex, show_requested: Arc<AtomicBool>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("Failed to read stdin: {err}");
                break;
            }
        };
        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };
        let session_cmd = match cmd {
            Command::Paint { x, y, color } => SessionCommand::Paint {
                coordinate: Coordinate::new(x, y),
                color,
            },
            Command::Click { px, py, color } => SessionCommand::PointerClick { px, py, color },
            Command::Show => {
                show_requested.store(true, Ordering::SeqCst);
                SessionCommand::Flush
            }
            Command::Palette => {
                print!("{}", palette_listing(&palette));
                continue;
            }
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => SessionCommand::Shutdown,
        };
        let quit = matches!(session_cmd, SessionCommand::Shutdown);
        if commands.blocking_send(session_cmd).is_err() || quit {
            break;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = start_logger(&args.log);

    log::info!("Starting pixel_client {}", env!("CARGO_PKG_VERSION"));

    let config = SyncConfig::load(&args.config).with_context(|| format!("Failed to load {}", args.config.display()))?;
    let palette = config.palette()?;
    log::info!(
        "canvas {}x{}, {} colors, cooldown {}s, {} shard(s)",
        config.canvas_cols,
        config.canvas_rows,
        palette.len(),
        config.cooldown_seconds,
        config.shard_count()
    );

    let show_requested = Arc::new(AtomicBool::new(false));
    let surface = TerminalCanvas::new(config.canvas_cols, config.canvas_rows, palette.clone(), args.watch, show_requested.clone());

    let (tx, rx) = mpsc::channel(32);
    std::thread::spawn(move || read_commands(tx, palette, show_requested));

    let mut observer = ConsoleObserver;
    let surface = run_session(config, SessionToken::new(args.token), surface, StderrCountdown::default(), &mut observer, rx).await?;

    log::info!("Session ended, {} cells known.", surface.buffer().painted());
    Ok(())
}
