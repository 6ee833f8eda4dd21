//! Forecasting core
//!
//! Pure, synchronous composition of a [`ModelBundle`](crate::bundle::ModelBundle)
//! into point forecasts. Nothing here performs I/O or keeps state between calls.

pub mod batch;
pub mod engine;
pub mod global;
pub mod trend;

pub use batch::{
    BatchForecaster, anchor_from_records, batch_forecast, forecast_timestamps, parse_anchor,
};
pub use engine::{DEFAULT_EPSILON, ForecastEngine, shifted_geometric_mean};
pub use global::GlobalResolver;
pub use trend::{TrendResolver, date_ordinal};

use crate::bundle::Regressor;
use crate::models::{Estimate, Variable};
use tracing::warn;

/// Run one model; a failing or non-finite evaluation becomes `Unavailable`.
fn evaluate_guarded(model: &dyn Regressor, x: f64, variable: Variable, source: &str) -> Estimate {
    match model.evaluate(x) {
        Ok(value) => Estimate::from_value(value),
        Err(err) => {
            warn!(%variable, source, input = x, error = %err, "Model evaluation failed");
            Estimate::Unavailable
        }
    }
}
