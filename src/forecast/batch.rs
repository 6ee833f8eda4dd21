//! Horizon driver: runs the engine over every future hour and column

use super::engine::ForecastEngine;
use crate::bundle::ModelBundle;
use crate::models::{Estimate, ForecastTable, Variable, WeatherRecord};
use crate::{MeteocastError, Result};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Parse an anchor timestamp. Only RFC 3339 with an explicit offset is accepted.
pub fn parse_anchor(input: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input.trim()).map_err(|e| {
        MeteocastError::validation(format!(
            "anchor '{input}' must be an RFC 3339 timestamp with a time zone offset ({e})"
        ))
    })
}

/// Latest timestamp of a store query, used as the forecast anchor
#[must_use]
pub fn anchor_from_records(records: &[WeatherRecord]) -> Option<DateTime<Utc>> {
    records.iter().map(|record| record.timestamp).max()
}

/// `anchor + 1h ..= anchor + horizon_hours·1h`, ascending
pub fn forecast_timestamps<Tz: TimeZone>(
    anchor: &DateTime<Tz>,
    horizon_hours: u32,
) -> Result<Vec<DateTime<Tz>>> {
    if horizon_hours == 0 {
        return Err(MeteocastError::validation(
            "forecast horizon must be a positive number of hours",
        ));
    }
    (1..=i64::from(horizon_hours))
        .map(|step| {
            anchor
                .clone()
                .checked_add_signed(TimeDelta::hours(step))
                .ok_or_else(|| {
                    MeteocastError::validation(format!(
                        "anchor + {step}h is outside the supported date range"
                    ))
                })
        })
        .collect()
}

/// Builds a complete forecast table for a horizon
#[derive(Debug, Clone, Copy)]
pub struct BatchForecaster<'a> {
    engine: ForecastEngine<'a>,
}

impl<'a> BatchForecaster<'a> {
    #[must_use]
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self::with_engine(ForecastEngine::new(bundle))
    }

    #[must_use]
    pub fn with_engine(engine: ForecastEngine<'a>) -> Self {
        Self { engine }
    }

    /// Forecast every modeled variable for each hour after `anchor`.
    ///
    /// Input is validated before any model runs. Afterwards the table is always
    /// complete: each cell holds a value or `Unavailable`.
    #[instrument(name = "batch_forecast", skip_all, fields(anchor = %anchor.naive_utc(), horizon_hours = horizon_hours))]
    pub fn run<Tz: TimeZone>(
        &self,
        anchor: &DateTime<Tz>,
        horizon_hours: u32,
    ) -> Result<ForecastTable> {
        let timestamps = forecast_timestamps(anchor, horizon_hours)?;
        let columns = self.engine.bundle().modeled_variables();
        let mut table = ForecastTable::new(columns.clone());
        let mut unavailable = 0usize;

        for timestamp in &timestamps {
            let values: BTreeMap<Variable, Estimate> = columns
                .iter()
                .map(|variable| (*variable, self.engine.forecast(*variable, timestamp)))
                .collect();
            unavailable += values.values().filter(|e| e.is_unavailable()).count();
            table.push_row(timestamp.fixed_offset(), values);
        }

        if unavailable > 0 {
            debug!(unavailable, "Some cells have no usable estimate");
        }
        info!(
            rows = table.len(),
            columns = table.columns.len(),
            "Forecast table assembled"
        );
        Ok(table)
    }
}

/// One-shot helper: forecast `horizon_hours` hours after `anchor` with `bundle`
pub fn batch_forecast<Tz: TimeZone>(
    anchor: &DateTime<Tz>,
    horizon_hours: u32,
    bundle: &ModelBundle,
) -> Result<ForecastTable> {
    BatchForecaster::new(bundle).run(anchor, horizon_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::LinearModel;
    use chrono::Timelike;
    use chrono_tz::Asia::Bangkok;
    use std::sync::Arc;

    fn all_hours_bundle() -> ModelBundle {
        let mut builder = ModelBundle::builder();
        for hour in 0..24 {
            builder = builder
                .trend(Variable::Temperature, hour, LinearModel::constant(25.0 + f64::from(hour)))
                .trend(Variable::Pressure, hour, LinearModel::constant(1008.0));
        }
        builder
            .global(
                Variable::Humidity,
                Some(Arc::new(LinearModel::new(-1.0, 100.0))),
                None,
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_timestamps_follow_anchor() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 3, &all_hours_bundle()).unwrap();
        let hours: Vec<u32> = table.timestamps().iter().map(Timelike::hour).collect();
        assert_eq!(hours, vec![1, 2, 3]);
        assert!(table.timestamps().iter().all(|t| *t > anchor.fixed_offset()));
    }

    #[test]
    fn test_columns_are_modeled_variables_in_order() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 2, &all_hours_bundle()).unwrap();
        assert_eq!(
            table.columns,
            vec![Variable::Temperature, Variable::Pressure, Variable::Humidity]
        );
        assert!(table.rows.iter().all(|row| row.values.len() == 3));
    }

    #[test]
    fn test_cells_come_from_engine() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 1, &all_hours_bundle()).unwrap();
        assert_eq!(table.rows[0].get(Variable::Temperature), Estimate::Value(26.0));
        // humidity: only the temp regression, 100 - 26
        let humidity = table.rows[0].get(Variable::Humidity).value().unwrap();
        assert!((humidity - 74.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let err = batch_forecast(&anchor, 0, &all_hours_bundle()).unwrap_err();
        assert!(matches!(err, MeteocastError::Validation { .. }));
    }

    #[test]
    fn test_missing_hours_leave_unavailable_cells() {
        let bundle = ModelBundle::builder()
            .trend(Variable::Pressure, 2, LinearModel::constant(1001.0))
            .build()
            .unwrap();
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 3, &bundle).unwrap();
        assert_eq!(
            table.column(Variable::Pressure),
            vec![Estimate::Unavailable, Estimate::Value(1001.0), Estimate::Unavailable]
        );
    }

    #[test]
    fn test_empty_bundle_gives_rows_without_columns() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 4, &ModelBundle::empty()).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_local_zone_is_kept() {
        // 00:00 in Bangkok is 17:00Z the previous day
        let anchor = Bangkok.with_ymd_and_hms(2025, 4, 20, 0, 0, 0).unwrap();
        let table = batch_forecast(&anchor, 2, &all_hours_bundle()).unwrap();
        let first = table.rows[0].timestamp;
        assert_eq!(first.hour(), 1);
        assert_eq!(first.offset().local_minus_utc(), 7 * 3600);
        assert_eq!(table.rows[0].get(Variable::Temperature), Estimate::Value(26.0));
    }

    #[test]
    fn test_parse_anchor() {
        let anchor = parse_anchor("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(anchor, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(parse_anchor("2024-01-01T07:00:00+07:00").is_ok());

        let err = parse_anchor("2024-01-01T00:00:00").unwrap_err();
        assert!(matches!(err, MeteocastError::Validation { .. }));
    }

    #[test]
    fn test_anchor_from_records() {
        let records: Vec<WeatherRecord> = [5, 9, 7]
            .into_iter()
            .map(|h| WeatherRecord::new(Utc.with_ymd_and_hms(2025, 4, 20, h, 0, 0).unwrap()))
            .collect();
        assert_eq!(
            anchor_from_records(&records),
            Some(Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap())
        );
        assert_eq!(anchor_from_records(&[]), None);
    }
}
