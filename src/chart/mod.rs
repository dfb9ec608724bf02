//! Chart data model
//!
//! - [`series`] - Reshapes resolved values into a [`SeriesDescription`]
//! - [`message`] - Messages to and from a chart display
//! - [`registry`] - The set of open chart displays

pub mod message;
pub mod registry;
pub mod series;

pub use message::{DisplayMessage, DisplayRequest};
pub use registry::{ChartDisplay, ChartRegistry, RefreshRequest, RefreshTrigger};
pub use series::{build, PiePoint, Series, SeriesDescription};
