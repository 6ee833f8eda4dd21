//! Per-hour trend lookup

use super::evaluate_guarded;
use crate::bundle::ModelBundle;
use crate::models::{Estimate, Variable};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};

/// Day number of `date` in the proleptic Gregorian calendar, 0001-01-01 being day 1.
///
/// This is the integer the trend models were fitted against.
#[must_use]
pub fn date_ordinal(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// Evaluates the trend model for a variable at the timestamp's hour-of-day
#[derive(Debug, Clone, Copy)]
pub struct TrendResolver<'a> {
    bundle: &'a ModelBundle,
}

impl<'a> TrendResolver<'a> {
    #[must_use]
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    /// Hour and date are read in the timestamp's own time zone.
    #[must_use]
    pub fn estimate<Tz: TimeZone>(&self, variable: Variable, timestamp: &DateTime<Tz>) -> Estimate {
        let hour = timestamp.hour();
        let Some(model) = self.bundle.trend_model(variable, hour) else {
            return Estimate::Unavailable;
        };
        let ordinal = date_ordinal(timestamp.date_naive());
        evaluate_guarded(model, f64::from(ordinal), variable, "trend")
    }
}
