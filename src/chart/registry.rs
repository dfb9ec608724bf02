//! Registry of open chart displays
//!
//! The registry is the only state shared between charts. It is owned by the
//! component that creates and closes displays (the frontend app) and passed
//! by reference to whoever needs to enumerate them, such as the
//! debugger-stopped handler that refreshes every open chart.

use super::message::DisplayMessage;
use super::series::SeriesDescription;
use crate::types::{ChartId, ChartKind};
use chrono::{DateTime, Local};

/// What caused a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Chart was just created
    Created,
    /// The chart's refresh button was pressed
    Manual,
    /// The debug adapter reported the debuggee stopped
    DebuggerStopped,
    /// The chart became visible again
    BecameVisible,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Created => write!(f, "created"),
            RefreshTrigger::Manual => write!(f, "manual"),
            RefreshTrigger::DebuggerStopped => write!(f, "debugger stopped"),
            RefreshTrigger::BecameVisible => write!(f, "became visible"),
        }
    }
}

/// Everything the backend needs to refresh one chart
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshRequest {
    pub chart_id: ChartId,
    pub names: Vec<String>,
    pub kind: ChartKind,
    pub trigger: RefreshTrigger,
}

/// An open chart display
#[derive(Debug, Clone)]
pub struct ChartDisplay {
    pub id: ChartId,
    pub title: String,
    /// Watched names, fixed at creation
    pub names: Vec<String>,
    pub kind: ChartKind,
    /// Last series received, drawn until the next update
    pub latest: Option<SeriesDescription>,
    pub last_updated: Option<DateTime<Local>>,
    pub update_count: u64,
}

impl ChartDisplay {
    fn new(id: ChartId, names: Vec<String>, kind: ChartKind) -> Self {
        Self {
            id,
            title: format!("Debug Chart ({})", names.join(", ")),
            names,
            kind,
            latest: None,
            last_updated: None,
            update_count: 0,
        }
    }

    fn refresh_request(&self, trigger: RefreshTrigger) -> RefreshRequest {
        RefreshRequest {
            chart_id: self.id,
            names: self.names.clone(),
            kind: self.kind,
            trigger,
        }
    }
}

/// Registry of open charts, in creation order
#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: Vec<ChartDisplay>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a chart and return its id
    pub fn create(&mut self, names: Vec<String>, kind: ChartKind) -> ChartId {
        let id = ChartId::next();
        tracing::debug!("Opened chart {} ({}) watching {:?}", id, kind, names);
        self.charts.push(ChartDisplay::new(id, names, kind));
        id
    }

    /// Close a chart; late updates for it are discarded
    pub fn close(&mut self, id: ChartId) -> Option<ChartDisplay> {
        let index = self.charts.iter().position(|c| c.id == id)?;
        tracing::debug!("Closed chart {}", id);
        Some(self.charts.remove(index))
    }

    pub fn get(&self, id: ChartId) -> Option<&ChartDisplay> {
        self.charts.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ChartId) -> Option<&mut ChartDisplay> {
        self.charts.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ChartId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartDisplay> {
        self.charts.iter()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Refresh request for a single chart
    pub fn refresh_one(&self, id: ChartId, trigger: RefreshTrigger) -> Option<RefreshRequest> {
        self.get(id).map(|chart| chart.refresh_request(trigger))
    }

    /// Refresh requests for every open chart
    pub fn refresh_all(&self, trigger: RefreshTrigger) -> Vec<RefreshRequest> {
        self.charts
            .iter()
            .map(|chart| chart.refresh_request(trigger))
            .collect()
    }

    /// Deliver a display message to a chart
    ///
    /// Updates are applied unconditionally, so the last one to arrive wins.
    /// Returns `false` if the chart has been closed.
    pub fn deliver(&mut self, id: ChartId, message: DisplayMessage) -> bool {
        let Some(chart) = self.get_mut(id) else {
            tracing::trace!("Discarding update for closed chart {}", id);
            return false;
        };

        match message {
            DisplayMessage::UpdateChart { data } => {
                chart.latest = Some(data);
                chart.last_updated = Some(Local::now());
                chart.update_count += 1;
            }
        }
        true
    }
}
