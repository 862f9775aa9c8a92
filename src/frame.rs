//! Per-day join of country geometry with one column of the count table.

use crate::error::Result;
use crate::geometry::GeometryCatalog;
use crate::models::{DayFrame, DayFrameRow};
use crate::scale::ScaleFactor;
use crate::series::TimeSeriesStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How geometry feature names are matched to series column names.
///
/// Names match verbatim unless an alias maps a geometry name onto a
/// differently spelled column (e.g. `"United States of America"` -> `"USA"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPolicy {
    pub aliases: BTreeMap<String, String>,
}

impl JoinPolicy {
    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Series column to read for a geometry feature.
    pub fn column_for<'a>(&'a self, feature_name: &'a str) -> &'a str {
        self.aliases
            .get(feature_name)
            .map(String::as_str)
            .unwrap_or(feature_name)
    }
}

/// Builds a fresh [`DayFrame`] for one selected day.
///
/// Holds only shared references to read-only inputs, so any number of builders
/// can run against the same store and catalog.
#[derive(Debug, Clone, Copy)]
pub struct DayFrameBuilder<'a> {
    store: &'a TimeSeriesStore,
    catalog: &'a GeometryCatalog,
    scale: ScaleFactor,
    join: &'a JoinPolicy,
}

impl<'a> DayFrameBuilder<'a> {
    pub fn new(
        store: &'a TimeSeriesStore,
        catalog: &'a GeometryCatalog,
        scale: ScaleFactor,
        join: &'a JoinPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            scale,
            join,
        }
    }

    /// One row per retained geometry feature, in catalog order.
    ///
    /// Countries without a series column still get a row, with a missing rate;
    /// their names are collected in `DayFrame::unmatched`.
    ///
    /// ### Errors
    /// `Error::Range` if `day` is outside `[0, N-1]`; checked before any work.
    pub fn build(&self, day: usize) -> Result<DayFrame> {
        let column = self.store.day_column(day)?;
        let date = self.store.dates()[day];

        let mut rows = Vec::with_capacity(self.catalog.len());
        let mut unmatched = Vec::new();
        for feature in self.catalog.features() {
            let key = self.join.column_for(&feature.name);
            let rate = match column.get(key) {
                Some(v) => *v,
                None => {
                    unmatched.push(feature.name.clone());
                    None
                }
            };
            rows.push(DayFrameRow {
                name: feature.name.clone(),
                x: feature.centroid.x,
                y: feature.centroid.y,
                rate,
                scaled_size: rate.map(|r| self.scale.scale_marker(r)),
            });
        }

        if !unmatched.is_empty() {
            log::debug!(
                "day {}: {} of {} features have no series column",
                day,
                unmatched.len(),
                rows.len()
            );
        }
        Ok(DayFrame {
            day,
            date,
            rows,
            unmatched,
        })
    }
}
