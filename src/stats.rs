use crate::series::SeriesView;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary statistics for one country column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountrySummary {
    pub country: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub total: f64,
    /// First date on which `max` was reached.
    pub peak_date: Option<NaiveDate>,
}

/// Compute per-country statistics over any series view, in column order.
pub fn country_summaries(view: &SeriesView) -> Vec<CountrySummary> {
    let mut out = Vec::with_capacity(view.countries().len());
    for country in view.countries() {
        let column = view.country_column(country).unwrap_or_default();
        let missing = column.iter().filter(|v| v.is_none()).count();

        let mut peak: Option<(usize, f64)> = None;
        for (day, v) in column.iter().enumerate() {
            if let Some(v) = *v {
                if peak.is_none_or(|(_, best)| v > best) {
                    peak = Some((day, v));
                }
            }
        }

        let mut vals: Vec<f64> = column.into_iter().flatten().collect();
        vals.sort_by(|a, b| a.total_cmp(b));
        let count = vals.len();
        let total: f64 = vals.iter().sum();
        let mean = if count > 0 {
            Some(total / count as f64)
        } else {
            None
        };
        let median = if count == 0 {
            None
        } else if count % 2 == 1 {
            Some(vals[count / 2])
        } else {
            Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
        };
        out.push(CountrySummary {
            country: country.clone(),
            count,
            missing,
            min: vals.first().copied(),
            max: vals.last().copied(),
            mean,
            median,
            total,
            peak_date: peak.map(|(day, _)| view.dates()[day]),
        });
    }
    out
}
