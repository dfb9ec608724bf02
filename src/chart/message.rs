//! Messages exchanged with a chart display
//!
//! The display is an opaque sink: it receives [`DisplayMessage`]s and may send
//! back [`DisplayRequest`]s. Both serialize with a `command` tag so they can
//! cross a process or webview boundary unchanged:
//!
//! ```text
//! -> {"command":"updateChart","data":[...]}
//! <- {"command":"refresh"}
//! ```

use super::series::SeriesDescription;
use serde::{Deserialize, Serialize};

/// Message sent to a chart display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum DisplayMessage {
    /// Replace everything the chart shows
    UpdateChart { data: SeriesDescription },
}

impl DisplayMessage {
    pub fn update(data: SeriesDescription) -> Self {
        DisplayMessage::UpdateChart { data }
    }
}

/// Message sent by a chart display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum DisplayRequest {
    /// The user asked for fresh values
    Refresh,
}
