use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Geometric centroid of a country polygon, in the geometry's own coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl From<geo::Point<f64>> for Centroid {
    fn from(p: geo::Point<f64>) -> Self {
        Self { x: p.x(), y: p.y() }
    }
}

/// One country on the map for a single day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayFrameRow {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Raw count for the day; `None` when the country has no data column or the cell is empty.
    pub rate: Option<f64>,
    /// `rate / (scale factor / 2)`; missing whenever `rate` is.
    pub scaled_size: Option<f64>,
}

/// The joined geometry + rate dataset driving one render of the map layer.
///
/// Built for exactly one day and replaced on the next selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayFrame {
    pub day: usize,
    pub date: NaiveDate,
    /// One row per retained geometry feature, in catalog order.
    pub rows: Vec<DayFrameRow>,
    /// Geometry names that had no matching series column.
    pub unmatched: Vec<String>,
}

impl DayFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, name: &str) -> Option<&DayFrameRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

/// Event emitted after every successful day selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReady {
    pub frame: DayFrame,
    pub date: NaiveDate,
    /// Display label for the date (`dd-mm-YYYY`).
    pub label: String,
}
