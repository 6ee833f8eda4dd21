//! `meteocast` - hourly weather forecasting from precomputed models
//!
//! This library turns a bundle of independently fitted per-variable models
//! into one coherent multi-step forecast, and carries the collaborators
//! around it: configuration, the time-series store and the Open-Meteo client.

pub mod bundle;
pub mod config;
pub mod error;
pub mod forecast;
pub mod logging;
pub mod models;
pub mod store;
pub mod weather;

// Re-export core types for public API
pub use bundle::{BundleHandle, LinearModel, ModelBundle, Regressor};
pub use config::MeteocastConfig;
pub use error::MeteocastError;
pub use forecast::{BatchForecaster, ForecastEngine, batch_forecast, parse_anchor};
pub use models::{BaseVariable, Estimate, ForecastTable, Variable, WeatherRecord};
pub use store::{FjallStore, MemoryStore, TimeSeriesStore};
pub use weather::OpenMeteoClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MeteocastError>;
