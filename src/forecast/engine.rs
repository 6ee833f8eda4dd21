//! Recursive forecast composition
//!
//! Base variables (temperature, pressure) come straight from their trend model.
//! A derived variable with a global entry combines up to three candidates:
//! its own trend, the regression on the temperature forecast and the
//! regression on the pressure forecast. Available candidates are merged with a
//! shifted geometric mean. The recursion into the base variables goes one level
//! deep and then stops, since base variables never recurse.

use super::global::GlobalResolver;
use super::trend::TrendResolver;
use crate::bundle::ModelBundle;
use crate::models::{BaseVariable, Estimate, Variable, VariableKind};
use crate::{MeteocastError, Result};
use chrono::{DateTime, TimeZone};
use tracing::trace;

/// Positivity guard added to each candidate before taking its logarithm
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// `exp(mean(ln(max(v + ε, ε))))` over `values`; `None` for an empty slice.
///
/// The shift is not subtracted again afterwards, and negative inputs are
/// clamped to `ε`.
#[must_use]
pub fn shifted_geometric_mean(values: &[f64], epsilon: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let log_sum: f64 = values
        .iter()
        .map(|v| (v + epsilon).max(epsilon).ln())
        .sum();
    Some((log_sum / values.len() as f64).exp())
}

/// Point forecasts for single (variable, timestamp) pairs.
///
/// Holds no state between calls: the same bundle and timestamp always give
/// bit-identical results.
#[derive(Debug, Clone, Copy)]
pub struct ForecastEngine<'a> {
    bundle: &'a ModelBundle,
    trend: TrendResolver<'a>,
    global: GlobalResolver<'a>,
    epsilon: f64,
}

impl<'a> ForecastEngine<'a> {
    #[must_use]
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self {
            bundle,
            trend: TrendResolver::new(bundle),
            global: GlobalResolver::new(bundle),
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Engine with a custom positivity guard; `epsilon` must be finite and positive
    pub fn with_epsilon(bundle: &'a ModelBundle, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(MeteocastError::validation(format!(
                "epsilon must be a positive finite number, got {epsilon}"
            )));
        }
        Ok(Self {
            epsilon,
            ..Self::new(bundle)
        })
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn bundle(&self) -> &'a ModelBundle {
        self.bundle
    }

    /// Forecast `variable` at `timestamp`
    #[must_use]
    pub fn forecast<Tz: TimeZone>(&self, variable: Variable, timestamp: &DateTime<Tz>) -> Estimate {
        if !self.bundle.is_modeled(variable) {
            return Estimate::Unavailable;
        }

        let trend = self.trend.estimate(variable, timestamp);
        match variable.kind() {
            VariableKind::Base => trend,
            VariableKind::Derived => self.compose(variable, trend, timestamp),
        }
    }

    fn compose<Tz: TimeZone>(
        &self,
        variable: Variable,
        trend: Estimate,
        timestamp: &DateTime<Tz>,
    ) -> Estimate {
        if !self.bundle.has_global(variable) {
            return trend;
        }

        let [temp_est, press_est] =
            BaseVariable::ALL.map(|base| self.forecast(base.into(), timestamp));
        if temp_est.is_unavailable() && press_est.is_unavailable() {
            return trend;
        }

        let from_temp = self
            .global
            .estimate(variable, temp_est, BaseVariable::Temperature);
        let from_press = self
            .global
            .estimate(variable, press_est, BaseVariable::Pressure);

        let candidates: Vec<f64> = [trend, from_temp, from_press]
            .into_iter()
            .filter_map(Estimate::value)
            .collect();
        trace!(
            %variable,
            %trend,
            %from_temp,
            %from_press,
            "Combining {} candidates",
            candidates.len()
        );

        shifted_geometric_mean(&candidates, self.epsilon)
            .map_or(Estimate::Unavailable, Estimate::from_value)
    }
}
