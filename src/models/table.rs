//! Forecast table: timestamps × variables

use super::{Estimate, Variable};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Estimates for every column at one forecast timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<FixedOffset>,
    pub values: BTreeMap<Variable, Estimate>,
}

impl ForecastRow {
    #[must_use]
    pub fn get(&self, variable: Variable) -> Estimate {
        self.values.get(&variable).copied().unwrap_or_default()
    }
}

/// Ordered forecast results. Every row carries a cell for every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    /// Column set in canonical variable order
    pub columns: Vec<Variable>,
    /// Rows sorted by ascending timestamp
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    #[must_use]
    pub fn new(columns: Vec<Variable>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; columns missing from `values` are recorded as unavailable.
    pub fn push_row(
        &mut self,
        timestamp: DateTime<FixedOffset>,
        mut values: BTreeMap<Variable, Estimate>,
    ) {
        for column in &self.columns {
            values.entry(*column).or_insert(Estimate::Unavailable);
        }
        values.retain(|variable, _| self.columns.contains(variable));
        self.rows.push(ForecastRow { timestamp, values });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        self.rows.iter().map(|row| row.timestamp).collect()
    }

    /// Cell lookup; `None` if the timestamp or column is not part of the table
    #[must_use]
    pub fn get<Tz: chrono::TimeZone>(
        &self,
        timestamp: &DateTime<Tz>,
        variable: Variable,
    ) -> Option<Estimate> {
        self.rows
            .iter()
            .find(|row| row.timestamp == *timestamp)
            .and_then(|row| row.values.get(&variable).copied())
    }

    /// All estimates of one variable in timestamp order
    #[must_use]
    pub fn column(&self, variable: Variable) -> Vec<Estimate> {
        if !self.columns.contains(&variable) {
            return Vec::new();
        }
        self.rows.iter().map(|row| row.get(variable)).collect()
    }
}

impl fmt::Display for ForecastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<17}", "time")?;
        for column in &self.columns {
            write!(f, " {:>10}", column.label())?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<17}", row.timestamp.format("%Y-%m-%d %H:%M"))?;
            for column in &self.columns {
                write!(f, " {:>10}", row.get(*column).to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
