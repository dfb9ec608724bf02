//! Builders for test fixtures

use debugchart_rs::backend::MemorySession;
use debugchart_rs::config::{AppConfig, SavedChart, SessionConfig};
use debugchart_rs::types::ChartKind;

/// Values `0.0, 1.0, ..` as strings, the way an adapter prints an array
pub fn numbered(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}", i as f64)).collect()
}

/// A paused session with a scalar `x`, an array `arr` of `len` numbered
/// elements, and a non-numeric `label`
pub fn session_with_array(len: usize) -> MemorySession {
    MemorySession::new()
        .with_scalar("x", "3.14")
        .with_array("arr", numbered(len))
        .with_scalar("label", "\"hello\"")
}

/// Builder for [`AppConfig`] values used by tests
#[derive(Default)]
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.session.address = address.into();
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.session.request_timeout_ms = Some(ms);
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.config.fetch.page_size = page_size;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.fetch.max_pages = Some(max_pages);
        self
    }

    pub fn chart(mut self, names: &[&str], kind: ChartKind) -> Self {
        self.config.charts.push(SavedChart {
            names: names.iter().map(|n| n.to_string()).collect(),
            kind,
        });
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }

    pub fn session(self) -> SessionConfig {
        self.config.session
    }
}
