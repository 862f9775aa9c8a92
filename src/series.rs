//! The daily per-country count table and its derived views.
//!
//! The raw table is stored row-major by date. Column-major access (one
//! country across all days) and the per-day "transposed" view used by the
//! map join are computed on demand from the same immutable rows, so there are
//! no intermediate tables to keep in sync.
//!
//! Dates need a four-digit year. Slash-separated dates without a leading year
//! are read month first, so `03/01/2020` is 1 March 2020.

use crate::error::{Error, Result};
use crate::scale::ScaleFactor;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Date layouts accepted in the first column, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Cell spellings treated as a missing value rather than a format error.
const MISSING_MARKERS: [&str; 5] = ["", "NA", "NaN", "nan", "null"];

/// A date-by-country table of optional values.
///
/// Used for the raw counts as well as every derived series; all share the
/// same dates and country order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    dates: Vec<NaiveDate>,
    countries: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl SeriesView {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Number of days (rows).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn country_index(&self, country: &str) -> Option<usize> {
        self.countries.iter().position(|c| c == country)
    }

    /// All values of one day, in country order.
    pub fn row(&self, day: usize) -> Option<&[Option<f64>]> {
        self.rows.get(day).map(Vec::as_slice)
    }

    /// Single cell; `None` for an unknown day/country as well as for a missing value.
    pub fn value(&self, day: usize, country: &str) -> Option<f64> {
        let idx = self.country_index(country)?;
        self.rows.get(day).and_then(|r| r[idx])
    }

    /// One country across all days.
    pub fn country_column(&self, country: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.country_index(country)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// One day as a country -> value map.
    pub fn day_column(&self, day: usize) -> Option<BTreeMap<&str, Option<f64>>> {
        let row = self.rows.get(day)?;
        Some(
            self.countries
                .iter()
                .map(String::as_str)
                .zip(row.iter().copied())
                .collect(),
        )
    }

    fn map_rows<F>(&self, mut f: F) -> SeriesView
    where
        F: FnMut(usize, &[Option<f64>]) -> Vec<Option<f64>>,
    {
        SeriesView {
            dates: self.dates.clone(),
            countries: self.countries.clone(),
            rows: self.rows.iter().enumerate().map(|(i, r)| f(i, r)).collect(),
        }
    }
}

/// Owner of the raw per-day counts and the change/cumulative views derived from them.
///
/// Immutable after load. Derived views are computed lazily and cached.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    raw: SeriesView,
    change: OnceLock<SeriesView>,
    cumulative: OnceLock<SeriesView>,
}

impl TimeSeriesStore {
    /// Load a wide CSV table: first column a date, remaining columns one per country.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        log::info!("loading counts from {}", path.display());
        Self::from_reader(file)
    }

    /// Same as [`TimeSeriesStore::from_path`] for any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(rec.iter().map(str::to_string).collect());
        }
        Self::from_table(header, rows)
    }

    /// Format-agnostic entry point: a header row plus string cells.
    ///
    /// ### Errors
    /// `Error::Format` naming the offending row/column when the first column is
    /// not a contiguous daily date sequence, a country column is unnamed or
    /// duplicated, or a cell is neither numeric nor empty.
    pub fn from_table(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if header.len() < 2 {
            return Err(Error::format(
                "header",
                "expected a date column followed by at least one country column",
            ));
        }
        let date_col = header[0].clone();
        let countries: Vec<String> = header[1..].to_vec();

        let mut seen = BTreeSet::new();
        for (i, c) in countries.iter().enumerate() {
            if c.is_empty() {
                return Err(Error::format(
                    format!("header column {}", i + 2),
                    "country column has no name",
                ));
            }
            if !seen.insert(c.as_str()) {
                return Err(Error::format(
                    format!("header column '{}'", c),
                    "duplicate country column",
                ));
            }
        }

        if rows.is_empty() {
            return Err(Error::format("table", "no data rows"));
        }

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(rows.len());
        let mut values: Vec<Vec<Option<f64>>> = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 1;
            if row.len() != header.len() {
                return Err(Error::format(
                    format!("row {}", row_no),
                    format!("expected {} cells, found {}", header.len(), row.len()),
                ));
            }

            let date = parse_date(&row[0]).ok_or_else(|| {
                Error::format(
                    format!("row {}, column '{}'", row_no, date_col),
                    format!("unparseable date '{}'", row[0]),
                )
            })?;
            if let Some(prev) = dates.last() {
                if prev.succ_opt() != Some(date) {
                    return Err(Error::format(
                        format!("row {}, column '{}'", row_no, date_col),
                        format!("date {} does not follow {} by exactly one day", date, prev),
                    ));
                }
            }
            dates.push(date);

            let mut cells = Vec::with_capacity(countries.len());
            for (cell, country) in row[1..].iter().zip(&countries) {
                let v = parse_count(cell).map_err(|msg| {
                    Error::format(format!("row {}, column '{}'", row_no, country), msg)
                })?;
                cells.push(v);
            }
            values.push(cells);
        }

        if values.iter().flatten().all(Option::is_none) {
            return Err(Error::format("table", "no numeric values"));
        }

        log::info!(
            "loaded {} days x {} countries ({} .. {})",
            dates.len(),
            countries.len(),
            dates[0],
            dates[dates.len() - 1]
        );

        Ok(Self {
            raw: SeriesView {
                dates,
                countries,
                rows: values,
            },
            change: OnceLock::new(),
            cumulative: OnceLock::new(),
        })
    }

    /// The raw counts, row-major by date.
    pub fn raw(&self) -> &SeriesView {
        &self.raw
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.raw.dates()
    }

    pub fn countries(&self) -> &[String] {
        self.raw.countries()
    }

    /// Number of days N; valid day indices are `0..N`.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.raw.dates[0]
    }

    pub fn end_date(&self) -> NaiveDate {
        self.raw.dates[self.raw.dates.len() - 1]
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.raw.country_index(country).is_some()
    }

    /// Reject a day index outside `[0, N-1]`.
    pub fn check_day(&self, day: usize) -> Result<()> {
        if day < self.len() {
            Ok(())
        } else {
            Err(self.out_of_range(day))
        }
    }

    fn out_of_range(&self, day: usize) -> Error {
        Error::Range {
            requested: format!("day {}", day),
            valid: format!("[0, {}]", self.len() - 1),
        }
    }

    /// Raw count for one country on one day (`Ok(None)` for an empty cell).
    pub fn value(&self, day: usize, country: &str) -> Result<Option<f64>> {
        self.check_day(day)?;
        let idx = self
            .raw
            .country_index(country)
            .ok_or_else(|| Error::not_found(country))?;
        Ok(self.raw.rows[day][idx])
    }

    /// Column-major view: one country across all days.
    pub fn country_column(&self, country: &str) -> Result<Vec<Option<f64>>> {
        self.raw
            .country_column(country)
            .ok_or_else(|| Error::not_found(country))
    }

    /// Transposed per-day view: country -> count for the selected day.
    pub fn day_column(&self, day: usize) -> Result<BTreeMap<&str, Option<f64>>> {
        self.raw
            .day_column(day)
            .ok_or_else(|| self.out_of_range(day))
    }

    /// Every present cell of the raw table.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.raw.rows.iter().flatten().filter_map(|v| *v)
    }

    /// Day-over-day difference per country. Day 0 has no predecessor and is missing.
    pub fn change_series(&self) -> &SeriesView {
        self.change.get_or_init(|| {
            let rows = &self.raw.rows;
            self.raw.map_rows(|day, row| {
                if day == 0 {
                    return vec![None; row.len()];
                }
                row.iter()
                    .zip(&rows[day - 1])
                    .map(|(cur, prev)| match (cur, prev) {
                        (Some(c), Some(p)) => Some(c - p),
                        _ => None,
                    })
                    .collect()
            })
        })
    }

    /// Running sum per country up to and including each day.
    ///
    /// An empty cell stays missing in the output, but the running total
    /// carries over it to later days.
    pub fn cumulative_series(&self) -> &SeriesView {
        self.cumulative.get_or_init(|| {
            let mut totals = vec![0.0_f64; self.raw.countries.len()];
            self.raw.map_rows(|_, row| {
                row.iter()
                    .zip(totals.iter_mut())
                    .map(|(cell, total)| {
                        cell.map(|v| {
                            *total += v;
                            *total
                        })
                    })
                    .collect()
            })
        })
    }

    /// Raw counts divided by the global scale factor (timeline marker sizes).
    pub fn rescaled_series(&self, scale: ScaleFactor) -> SeriesView {
        self.raw.map_rows(|_, row| {
            row.iter()
                .map(|cell| cell.map(|v| scale.scale_series(v)))
                .collect()
        })
    }
}

/// Parse the first-column date, tolerating a trailing time component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day_part = s.split(['T', ' ']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(day_part, fmt)
                .ok()
                .filter(|d| d.year() >= 1000)
        })
}

fn parse_count(cell: &str) -> std::result::Result<Option<f64>, String> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("non-numeric count '{}'", cell)),
    }
}
