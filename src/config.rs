//! Run configuration, loadable from a JSON file and overridable from the CLI.
//!
//! ```json
//! {
//!   "counts": "data/deaths.csv",
//!   "map": "data/countries.geojson",
//!   "start_date": "2020-01-01",
//!   "end_date": "2020-04-16",
//!   "exclude": ["Antarctica"],
//!   "aliases": { "United States of America": "USA" }
//! }
//! ```

use crate::days::DayIndex;
use crate::error::{Error, Result};
use crate::frame::JoinPolicy;
use crate::geometry::{DEFAULT_NAME_PROPERTY, ExclusionPolicy};
use crate::scale::{DEFAULT_FALLBACK_FACTOR, DEFAULT_TARGET_RANGE};
use crate::series::TimeSeriesStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Wide CSV of daily counts.
    pub counts: Option<PathBuf>,
    /// GeoJSON feature collection of country boundaries.
    pub map: Option<PathBuf>,
    /// First selectable day; defaults to the first date of the series.
    pub start_date: Option<NaiveDate>,
    /// Last selectable day (inclusive); defaults to the last date of the series.
    pub end_date: Option<NaiveDate>,
    pub target_range: f64,
    /// Factor used when all counts are equal. `None` makes that case an error.
    pub fallback_factor: Option<f64>,
    /// Geometry feature names to drop.
    pub exclude: Vec<String>,
    /// Geometry name -> series column name.
    pub aliases: BTreeMap<String, String>,
    pub name_property: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            counts: None,
            map: None,
            start_date: None,
            end_date: None,
            target_range: DEFAULT_TARGET_RANGE,
            fallback_factor: Some(DEFAULT_FALLBACK_FACTOR),
            exclude: ExclusionPolicy::default().names().map(str::to_string).collect(),
            aliases: BTreeMap::new(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
        }
    }
}

impl Config {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(self.exclude.iter().cloned())
    }

    pub fn join_policy(&self) -> JoinPolicy {
        JoinPolicy {
            aliases: self.aliases.clone(),
        }
    }

    /// Selectable day span, validated against the loaded series.
    pub fn day_index(&self, store: &TimeSeriesStore) -> Result<DayIndex> {
        let idx = DayIndex::new(
            self.start_date.unwrap_or_else(|| store.start_date()),
            self.end_date.unwrap_or_else(|| store.end_date()),
        )?;
        idx.check_matches(store)?;
        Ok(idx)
    }

    pub fn counts_path(&self) -> Result<&Path> {
        require_path(&self.counts, "counts")
    }

    pub fn map_path(&self) -> Result<&Path> {
        require_path(&self.map, "map")
    }
}

fn require_path<'a>(path: &'a Option<PathBuf>, what: &str) -> Result<&'a Path> {
    path.as_deref()
        .ok_or_else(|| Error::InvalidConfig(format!("no {} file configured", what)))
}
