//! Data models for meteocast
//!
//! This module contains the core domain models organized by concern:
//! - Variable: the closed set of forecast variables and their kind
//! - Estimate: a value or an explicit "unavailable" marker
//! - Table: forecast results per timestamp and variable
//! - Record: observed rows and live readings from the collaborators

pub mod estimate;
pub mod record;
pub mod table;
pub mod variable;

// Re-export all public types for convenient access
pub use estimate::Estimate;
pub use record::{LiveReading, WeatherRecord};
pub use table::{ForecastRow, ForecastTable};
pub use variable::{BaseVariable, Variable, VariableKind};
