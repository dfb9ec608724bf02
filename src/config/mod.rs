//! Configuration module for debugchart-rs
//!
//! This module handles application configuration:
//! - How to reach the debug adapter (`[session]`)
//! - Paging behaviour of the value fetcher (`[fetch]`)
//! - Chart appearance (`[ui]`)
//! - Log output (`[logging]`)
//! - Charts to reopen at start-up (`[[charts]]`)
//!
//! # Config Location
//!
//! The config file is stored in the platform-appropriate data directory:
//! - **Linux**: `~/.local/share/dev.hxyulin.debugchart-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.debugchart-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.debugchart-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [session]
//! address = "127.0.0.1:4711"
//! request = "attach"
//!
//! [session.arguments]
//! pid = 4242
//!
//! [fetch]
//! page_size = 10
//!
//! [[charts]]
//! names = ["samples", "counter"]
//! kind = "line"
//! ```

use crate::error::{DebugChartError, Result};
use crate::types::ChartKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.debugchart-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default debug adapter address
pub const DEFAULT_ADAPTER_ADDRESS: &str = "127.0.0.1:4711";

/// Default log filter
pub const DEFAULT_LOG_LEVEL: &str = "info,debugchart_rs=debug";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        DebugChartError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            DebugChartError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Session ====================

/// How the debug session is started once connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StartRequest {
    /// Attach to an already running debuggee
    #[default]
    Attach,
    /// Ask the adapter to launch the debuggee
    Launch,
}

impl StartRequest {
    /// DAP command name
    pub fn command(&self) -> &'static str {
        match self {
            StartRequest::Attach => "attach",
            StartRequest::Launch => "launch",
        }
    }
}

impl std::fmt::Display for StartRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartRequest::Attach => write!(f, "Attach"),
            StartRequest::Launch => write!(f, "Launch"),
        }
    }
}

/// Debug adapter connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `host:port` of the adapter
    #[serde(default = "default_address")]
    pub address: String,

    /// Start request sent after `initialize`
    #[serde(default)]
    pub request: StartRequest,

    /// Adapter-specific arguments of the start request
    #[serde(default)]
    pub arguments: toml::Table,

    /// Give up waiting for a single response after this long
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_address() -> String {
    DEFAULT_ADAPTER_ADDRESS.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request: StartRequest::default(),
            arguments: toml::Table::new(),
            request_timeout_ms: None,
        }
    }
}

impl SessionConfig {
    /// Per-request timeout, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Start request arguments as JSON
    pub fn arguments_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.arguments).map_err(|e| {
            DebugChartError::Config(format!("Invalid session arguments: {}", e))
        })
    }
}

// ==================== Fetch ====================

/// Paging behaviour of the value fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Children requested per `variables` page
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Upper bound on pages per composite variable (unbounded when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

fn default_page_size() -> i64 {
    crate::backend::fetcher::PAGE_SIZE
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: None,
        }
    }
}

// ==================== UI ====================

/// Chart appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Show the legend on every chart
    #[serde(default = "default_true")]
    pub show_legend: bool,

    /// Line width for line and spline charts
    #[serde(default = "default_line_width")]
    pub line_width: f32,

    /// Interpolated points between two samples of a spline chart
    #[serde(default = "default_spline_samples")]
    pub spline_samples: usize,
}

fn default_true() -> bool {
    true
}

fn default_line_width() -> f32 {
    1.5
}

fn default_spline_samples() -> usize {
    8
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_legend: true,
            line_width: default_line_width(),
            spline_samples: default_spline_samples(),
        }
    }
}

// ==================== Logging ====================

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to a daily rolling file
    #[serde(default)]
    pub log_to_file: bool,

    /// Directory for log files (defaults to `<app data>/logs`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| app_data_dir().map(|p| p.join("logs")))
    }
}

// ==================== Saved Charts ====================

/// A chart reopened at start-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChart {
    pub names: Vec<String>,
    #[serde(default)]
    pub kind: ChartKind,
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub charts: Vec<SavedChart>,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| DebugChartError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DebugChartError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load a configuration file; a missing file yields the defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DebugChartError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            DebugChartError::Config("Could not determine config path".to_string())
        })?;
        Self::load_from(path)
    }

    /// Load from the given path (or the default location), returning defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let result = match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Write the configuration to a file, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DebugChartError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)
            .map_err(|e| DebugChartError::Config(format!("Failed to write config: {}", e)))
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }
}

// ==================== Tests ====================
