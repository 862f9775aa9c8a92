//! One global linear scale factor for marker sizes.
//!
//! The factor is derived once from the full raw table and reused for every
//! day, so marker sizes stay comparable across selections.

use crate::error::{Error, Result};
use crate::series::TimeSeriesStore;
use serde::Serialize;

/// Target size range the value span is mapped onto.
pub const DEFAULT_TARGET_RANGE: f64 = 100.0;

/// Factor used when the caller opts into a fallback for a degenerate range.
pub const DEFAULT_FALLBACK_FACTOR: f64 = 1.0;

/// `(global max - global min) / target_range`; always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Compute the factor over every present cell of the raw table.
    ///
    /// ### Errors
    /// - `Error::InvalidConfig` when `target_range` is not a positive finite number
    /// - `Error::DegenerateRange` when all values are equal
    pub fn compute(store: &TimeSeriesStore, target_range: f64) -> Result<Self> {
        if !(target_range.is_finite() && target_range > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "target range must be positive, got {}",
                target_range
            )));
        }
        let (min, max) = store
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        // A loaded store always holds at least one value, so min/max are finite here.
        if max <= min {
            return Err(Error::DegenerateRange { min, max });
        }
        let factor = (max - min) / target_range;
        log::debug!(
            "scale factor {} from range [{}, {}] / {}",
            factor,
            min,
            max,
            target_range
        );
        Ok(Self(factor))
    }

    /// Like [`ScaleFactor::compute`], substituting `fallback` for a degenerate range.
    pub fn compute_or(store: &TimeSeriesStore, target_range: f64, fallback: f64) -> Result<Self> {
        match Self::compute(store, target_range) {
            Err(Error::DegenerateRange { min, .. }) => {
                log::warn!(
                    "all values equal ({}); using fallback scale factor {}",
                    min,
                    fallback
                );
                Self::new(fallback)
            }
            other => other,
        }
    }

    /// Wrap an explicit factor.
    pub fn new(factor: f64) -> Result<Self> {
        if factor.is_finite() && factor > 0.0 {
            Ok(Self(factor))
        } else {
            Err(Error::InvalidConfig(format!(
                "scale factor must be positive, got {}",
                factor
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Divisor applied to map rates: half the factor.
    pub fn marker_divisor(self) -> f64 {
        self.0 / 2.0
    }

    /// Map marker size for a rate.
    pub fn scale_marker(self, rate: f64) -> f64 {
        rate / self.marker_divisor()
    }

    /// Timeline marker size for a raw count.
    pub fn scale_series(self, value: f64) -> f64 {
        value / self.0
    }
}

impl std::fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_factor() {
        assert!(ScaleFactor::new(0.0).is_err());
        assert!(ScaleFactor::new(f64::NAN).is_err());
        assert_eq!(ScaleFactor::new(0.5).unwrap().marker_divisor(), 0.25);
    }
}
