//! Session configuration.
//!
//! The canvas servers read a `config.json` with PascalCase keys; the client
//! accepts that file unchanged, so one file can describe a whole deployment.
//! TOML files with snake_case keys work as well.
//!
//! ```json
//! {
//!     "CanvasRows": 50,
//!     "CanvasCols": 100,
//!     "CooldownSeconds": 30,
//!     "PaletteColors": ["white", "black", "red"],
//!     "WebSocketAppAddresses": ["ws://localhost:8765/", "ws://localhost:8766/"]
//! }
//! ```

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::palette::PaletteIndex;
use crate::render::PointerMapping;
use crate::{Result, SyncError};

pub const DEFAULT_PIXEL_SIZE: u32 = 10;

fn default_pixel_size() -> u32 {
    DEFAULT_PIXEL_SIZE
}

/// Immutable configuration of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncConfig {
    #[serde(alias = "canvas_rows")]
    pub canvas_rows: u32,
    #[serde(alias = "canvas_cols")]
    pub canvas_cols: u32,
    #[serde(alias = "cooldown_seconds")]
    pub cooldown_seconds: u64,
    #[serde(alias = "palette_colors")]
    pub palette_colors: Vec<String>,
    /// One address per shard, in shard order.
    #[serde(default, alias = "web_socket_app_addresses")]
    pub web_socket_app_addresses: Vec<String>,
    /// Single server deployments only list this one.
    #[serde(default, alias = "web_socket_app_addr", skip_serializing_if = "Option::is_none")]
    pub web_socket_app_addr: Option<String>,
    /// Size of one canvas cell on screen, used to map pointer clicks.
    #[serde(default = "default_pixel_size", alias = "pixel_size")]
    pub pixel_size: u32,
}

impl SyncConfig {
    /// Load and validate a `.json` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml { Self::from_toml_str(&content) } else { Self::from_json_str(&content) }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(content).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the sync core relies on.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_rows == 0 || self.canvas_cols == 0 {
            return Err(SyncError::Config(format!(
                "canvas must be at least 1x1, got {}x{}",
                self.canvas_cols, self.canvas_rows
            )));
        }
        if self.pixel_size == 0 {
            return Err(SyncError::Config("pixel size must be at least 1".to_string()));
        }
        if self.shard_addresses().is_empty() {
            return Err(SyncError::Config("no websocket address configured".to_string()));
        }
        PaletteIndex::new(self.palette_colors.iter().cloned())?;
        Ok(())
    }

    /// Shard addresses in shard order. Falls back to the single legacy address.
    pub fn shard_addresses(&self) -> Vec<String> {
        if !self.web_socket_app_addresses.is_empty() {
            return self.web_socket_app_addresses.clone();
        }
        self.web_socket_app_addr.iter().cloned().collect()
    }

    pub fn shard_count(&self) -> usize {
        self.shard_addresses().len()
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn palette(&self) -> Result<PaletteIndex> {
        PaletteIndex::new(self.palette_colors.iter().cloned())
    }

    pub fn pointer_mapping(&self) -> PointerMapping {
        PointerMapping {
            pixel_size: self.pixel_size,
            cols: self.canvas_cols,
            rows: self.canvas_rows,
        }
    }
}
