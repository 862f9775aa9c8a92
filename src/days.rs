use crate::error::{Error, Result};
use crate::series::TimeSeriesStore;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Display format for selected dates (`16-04-2020`).
pub const LABEL_FORMAT: &str = "%d-%m-%Y";

/// Inclusive daily date span; maps day offsets to calendar dates and back.
///
/// The end never precedes the start. Deserialization goes through
/// [`DayIndex::new`], so a reversed span is rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DaySpan")]
pub struct DayIndex {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct DaySpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DaySpan> for DayIndex {
    type Error = Error;

    fn try_from(span: DaySpan) -> Result<Self> {
        Self::new(span.start, span.end)
    }
}

impl DayIndex {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidConfig(format!(
                "end date {} precedes start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Span covered by a loaded store.
    pub fn for_store(store: &TimeSeriesStore) -> Self {
        Self {
            start: store.start_date(),
            end: store.end_date(),
        }
    }

    /// Ensure a configured span agrees with the loaded series.
    pub fn check_matches(&self, store: &TimeSeriesStore) -> Result<()> {
        if self.start != store.start_date() || self.len() != store.len() {
            return Err(Error::InvalidConfig(format!(
                "configured days {} .. {} ({} days) do not match the series {} .. {} ({} days)",
                self.start,
                self.end,
                self.len(),
                store.start_date(),
                store.end_date(),
                store.len()
            )));
        }
        Ok(())
    }

    /// Number of selectable days N.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// A valid span always covers at least its start date.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, day: usize) -> bool {
        day < self.len()
    }

    pub fn to_date(&self, day: usize) -> Result<NaiveDate> {
        if !self.contains(day) {
            return Err(Error::Range {
                requested: format!("day {}", day),
                valid: format!("[0, {}]", self.len() - 1),
            });
        }
        self.start
            .checked_add_days(Days::new(day as u64))
            .ok_or_else(|| Error::InvalidConfig(format!("day {} overflows the calendar", day)))
    }

    pub fn from_date(&self, date: NaiveDate) -> Result<usize> {
        if date < self.start || date > self.end {
            return Err(Error::Range {
                requested: date.to_string(),
                valid: format!("{} .. {}", self.start, self.end),
            });
        }
        Ok((date - self.start).num_days() as usize)
    }

    /// `dd-mm-YYYY` label for a day.
    pub fn label(&self, day: usize) -> Result<String> {
        Ok(self.to_date(day)?.format(LABEL_FORMAT).to_string())
    }
}
