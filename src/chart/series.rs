//! Reshaping resolved values into chart series
//!
//! [`build`] turns a [`DataPoints`] mapping into a [`SeriesDescription`] that
//! any renderer can draw. Series kinds get one series per variable with
//! `[index, value]` points; pie charts get one named slice per element.
//!
//! The JSON form matches what a web chart expects:
//!
//! ```text
//! line/spline/bar/column: [{"name":"x","data":[[0,1.0],[1,2.0]]}, ...]
//! pie:                    [{"name":"x[0]","y":1.0}, {"name":"y","y":0.0}, ...]
//! ```
//!
//! JSON has no literal for non-finite numbers, so `Infinity`, `-Infinity` and
//! `NaN` travel as those strings and are read back as the same `f64`.
//!
//! The two shapes are told apart by their fields. An empty description has
//! no fields to look at and always reads back as `Series(vec![])`; [`build`]
//! never produces an empty pie for a non-empty watch list.

use crate::types::{ChartKind, DataPoints};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One series of `[index, value]` points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(with = "wire_points")]
    pub data: Vec<[f64; 2]>,
}

/// One named slice of a pie chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiePoint {
    pub name: String,
    #[serde(with = "wire_number")]
    pub y: f64,
}

/// An `f64` that keeps non-finite values on the wire
#[derive(Debug, Clone, Copy)]
struct WireNumber(f64);

impl Serialize for WireNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() {
            serializer.serialize_f64(value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }
}

impl<'de> Deserialize<'de> for WireNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(WireNumber(value)),
            Repr::Text(text) => match text.as_str() {
                "Infinity" => Ok(WireNumber(f64::INFINITY)),
                "-Infinity" => Ok(WireNumber(f64::NEG_INFINITY)),
                "NaN" => Ok(WireNumber(f64::NAN)),
                other => Err(serde::de::Error::custom(format!(
                    "expected a number, got '{}'",
                    other
                ))),
            },
        }
    }
}

mod wire_number {
    use super::WireNumber;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        WireNumber(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        WireNumber::deserialize(deserializer).map(|n| n.0)
    }
}

mod wire_points {
    use super::WireNumber;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(points: &[[f64; 2]], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().map(|[x, y]| [WireNumber(*x), WireNumber(*y)]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<[f64; 2]>, D::Error> {
        let points = Vec::<[WireNumber; 2]>::deserialize(deserializer)?;
        Ok(points.into_iter().map(|[x, y]| [x.0, y.0]).collect())
    }
}

/// Renderer-agnostic description of what a chart should show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesDescription {
    /// One series per variable (line, spline, bar, column)
    Series(Vec<Series>),
    /// Flattened named points (pie)
    Pie(Vec<PiePoint>),
}

impl SeriesDescription {
    /// Number of series or slices
    pub fn len(&self) -> usize {
        match self {
            SeriesDescription::Series(series) => series.len(),
            SeriesDescription::Pie(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of plotted values
    pub fn point_count(&self) -> usize {
        match self {
            SeriesDescription::Series(series) => series.iter().map(|s| s.data.len()).sum(),
            SeriesDescription::Pie(points) => points.len(),
        }
    }
}

/// Build the series description for a chart kind
pub fn build(data_points: &DataPoints, kind: ChartKind) -> SeriesDescription {
    if kind.is_pie() {
        SeriesDescription::Pie(build_pie(data_points))
    } else {
        SeriesDescription::Series(build_series(data_points))
    }
}

fn build_series(data_points: &DataPoints) -> Vec<Series> {
    data_points
        .iter()
        .map(|(name, values)| Series {
            name: name.to_string(),
            data: values
                .iter()
                .enumerate()
                .map(|(index, &value)| [index as f64, value])
                .collect(),
        })
        .collect()
}

fn build_pie(data_points: &DataPoints) -> Vec<PiePoint> {
    data_points
        .iter()
        .flat_map(|(name, values)| {
            if values.is_empty() {
                // An unresolved variable still gets a zero-valued slice labelled by its name
                vec![PiePoint {
                    name: name.to_string(),
                    y: 0.0,
                }]
            } else {
                values
                    .iter()
                    .enumerate()
                    .map(|(index, &value)| PiePoint {
                        name: format!("{}[{}]", name, index),
                        y: value,
                    })
                    .collect()
            }
        })
        .collect()
}
