//! Fitted model evaluation

use crate::{MeteocastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A fitted one-input regression function.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Regressor: Send + Sync + Debug {
    fn evaluate(&self, x: f64) -> Result<f64>;
}

/// Ordinary least-squares line: `slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(alias = "coef")]
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    #[must_use]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// A model that ignores its input
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(0.0, value)
    }
}

impl Regressor for LinearModel {
    fn evaluate(&self, x: f64) -> Result<f64> {
        if !self.slope.is_finite() || !self.intercept.is_finite() {
            return Err(MeteocastError::evaluation(format!(
                "non-finite coefficients (slope={}, intercept={})",
                self.slope, self.intercept
            )));
        }
        let y = self.slope.mul_add(x, self.intercept);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(MeteocastError::evaluation(format!(
                "non-finite result for input {x}"
            )))
        }
    }
}
