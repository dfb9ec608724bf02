//! Core data types for debugchart-rs
//!
//! # Main Types
//!
//! - [`ChartKind`] - The fixed set of chart kinds a chart can be created with
//! - [`ChartId`] - Identifier of an open chart display
//! - [`DataPoints`] - Ordered mapping from watched variable name to its resolved values
//! - [`ConnectionStatus`] - State of the debug adapter connection
//!
//! Resolved values are always plain `Vec<f64>`: a scalar becomes a
//! single-element vector, and anything that could not be resolved becomes an
//! empty vector.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of chart to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Straight line segments between points
    #[default]
    Line,
    /// Smoothed line through the points
    Spline,
    /// Horizontal bars
    Bar,
    /// Vertical bars
    Column,
    /// One slice per (variable, index) pair
    Pie,
}

impl ChartKind {
    /// All chart kinds in selection order
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Spline,
        ChartKind::Bar,
        ChartKind::Column,
        ChartKind::Pie,
    ];

    /// Lower-case identifier used in config files and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Spline => "spline",
            ChartKind::Bar => "bar",
            ChartKind::Column => "column",
            ChartKind::Pie => "pie",
        }
    }

    /// Pie charts flatten every element into its own named point
    pub fn is_pie(&self) -> bool {
        matches!(self, ChartKind::Pie)
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| format!("unknown chart kind '{}'", s))
    }
}

/// Unique identifier for an open chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(pub u64);

static NEXT_CHART_ID: AtomicU64 = AtomicU64::new(1);

impl ChartId {
    pub fn next() -> Self {
        Self(NEXT_CHART_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Split a comma-separated list of variable names
///
/// Names are trimmed and empty entries are dropped. Order is preserved and
/// duplicates are kept; they collapse when resolved into [`DataPoints`].
pub fn parse_watch_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the numeric prefix of a debugger value string
///
/// Adapters render values as text (`"3.14"`, `"42 '*'"`, `"1.5e+10"`), so
/// this accepts the longest leading decimal literal after optional whitespace,
/// plus `Infinity`. Anything without a leading number, including `NaN`, is
/// rejected.
pub fn parse_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let is_digit = |i: usize| i < len && bytes[i].is_ascii_digit();

    let mut end = 0;
    let negative = len > 0 && bytes[0] == b'-';
    if len > 0 && (bytes[0] == b'+' || bytes[0] == b'-') {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while is_digit(end) {
        end += 1;
    }
    let int_digits = end - int_start;

    let mut frac_digits = 0;
    if end < len && bytes[end] == b'.' {
        let dot = end;
        end += 1;
        while is_digit(end) {
            end += 1;
            frac_digits += 1;
        }
        if int_digits == 0 && frac_digits == 0 {
            end = dot;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while is_digit(exp_end) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Ordered mapping from watched variable name to resolved values
///
/// Insertion order defines series order. Inserting a name that is already
/// present replaces its values without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPoints {
    entries: Vec<(String, Vec<f64>)>,
}

impl DataPoints {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapping with every name present and mapped to an empty sequence
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut points = Self::new();
        for name in names {
            points.insert(name.as_ref(), Vec::new());
        }
        points
    }

    /// Insert or replace the values for a name
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Values for a name, if the name is present
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no entry carries any value
    pub fn all_empty(&self) -> bool {
        self.entries.iter().all(|(_, values)| values.is_empty())
    }

    /// Total number of values across all entries
    pub fn total_values(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f64>)> for DataPoints {
    fn from_iter<T: IntoIterator<Item = (S, Vec<f64>)>>(iter: T) -> Self {
        let mut points = DataPoints::new();
        for (name, values) in iter {
            points.insert(name, values);
        }
        points
    }
}

/// Represents the connection status to the debug adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected to any adapter
    #[default]
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Connected and ready
    Connected,
    /// Connection error occurred
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_kind_round_trip_str() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.as_str().parse::<ChartKind>(), Ok(kind));
        }
        assert!("area".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_chart_kind_serde_lowercase() {
        let json = serde_json::to_string(&ChartKind::Column).unwrap();
        assert_eq!(json, "\"column\"");
        let parsed: ChartKind = serde_json::from_str("\"pie\"").unwrap();
        assert!(parsed.is_pie());
    }

    #[test]
    fn test_parse_watch_list() {
        assert_eq!(parse_watch_list("x, y ,z"), vec!["x", "y", "z"]);
        assert_eq!(parse_watch_list(" a,, b ,"), vec!["a", "b"]);
        assert!(parse_watch_list("  ").is_empty());
    }

    #[test]
    fn test_parse_float_plain() {
        assert_eq!(parse_float("3.14"), Some(3.14));
        assert_eq!(parse_float("-2"), Some(-2.0));
        assert_eq!(parse_float("  42"), Some(42.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1.5e+3"), Some(1500.0));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("42 '*'"), Some(42.0));
        assert_eq!(parse_float("1.0f"), Some(1.0));
        assert_eq!(parse_float("0x10"), Some(0.0));
        assert_eq!(parse_float("7e"), Some(7.0));
    }

    #[test]
    fn test_parse_float_rejects_non_numeric() {
        assert_eq!(parse_float("undefined"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("{...}"), None);
    }

    #[test]
    fn test_parse_float_infinity() {
        assert_eq!(parse_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_data_points_order_and_replace() {
        let mut points = DataPoints::with_names(["x", "y"]);
        points.insert("z", vec![1.0]);
        points.insert("x", vec![2.0, 3.0]);

        let names: Vec<_> = points.names().collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(points.get("x"), Some(&[2.0, 3.0][..]));
        assert_eq!(points.get("y"), Some(&[][..]));
        assert_eq!(points.total_values(), 3);
    }

    #[test]
    fn test_data_points_duplicates_collapse() {
        let points = DataPoints::with_names(["a", "b", "a"]);
        assert_eq!(points.len(), 2);
        assert!(points.all_empty());
    }

    #[test]
    fn test_chart_id_unique() {
        assert_ne!(ChartId::next(), ChartId::next());
    }
}
