//! # debugchart-rs: live charts of a paused program's locals
//!
//! A chart tool that talks to a debug adapter over the Debug Adapter
//! Protocol. Whenever a chart is refreshed, the watched local variables of
//! the paused program are read (arrays and other composites are walked page
//! by page) and reshaped into chart series.
//!
//! ## Architecture
//!
//! - **Backend**: owns the debug session on a worker thread and resolves
//!   watched names with the [`backend::ValueFetcher`]
//! - **Chart**: reshapes resolved values into a [`chart::SeriesDescription`]
//!   and tracks the open chart displays
//! - **Frontend**: renders the UI using eframe/egui, one egui_dock tab per
//!   chart, drawn with egui_plot
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Settings and saved charts are stored in the platform-appropriate data
//! directory under `dev.hxyulin.debugchart-rs`:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.debugchart-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.debugchart-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.debugchart-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use debugchart_rs::{backend::DebugBackend, config::AppConfig, frontend::DebugChartApp};
//!
//! fn main() -> eframe::Result<()> {
//!     let config = AppConfig::load_or_default(None);
//!     let (backend, frontend) = DebugBackend::new(config.clone());
//!
//!     std::thread::spawn(move || backend.run());
//!
//!     eframe::run_native(
//!         "Debug Chart",
//!         eframe::NativeOptions::default(),
//!         Box::new(|_cc| Ok(Box::new(DebugChartApp::new(frontend, config, None)))),
//!     )
//! }
//! ```

pub mod backend;
pub mod chart;
pub mod config;
pub mod error;
pub mod frontend;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use backend::{DebugBackend, DebugSession, MemorySession, ValueFetcher};
pub use chart::{build, SeriesDescription};
pub use config::AppConfig;
pub use error::{DebugChartError, Result};
pub use frontend::DebugChartApp;
pub use types::{ChartKind, DataPoints};
