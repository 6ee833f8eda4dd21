//! Observed weather records and live readings

use super::Variable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hourly observation as held by the time-series store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WeatherRecord {
    /// Start of the observed hour, UTC
    pub timestamp: DateTime<Utc>,
    /// Temperature at 2 m in Celsius
    pub temperature: Option<f64>,
    /// Surface pressure in hPa
    pub pressure: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Precipitation probability in percent
    pub precipitation_probability: Option<f64>,
    /// Cloud cover in percent
    pub cloud_cover: Option<f64>,
    /// Wind speed at 10 m in km/h
    pub wind_speed: Option<f64>,
    /// Dew point at 2 m in Celsius
    pub dew_point: Option<f64>,
}

impl WeatherRecord {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    pub fn set(&mut self, variable: Variable, value: Option<f64>) {
        let slot = match variable {
            Variable::Temperature => &mut self.temperature,
            Variable::Pressure => &mut self.pressure,
            Variable::Humidity => &mut self.humidity,
            Variable::PrecipitationProbability => &mut self.precipitation_probability,
            Variable::CloudCover => &mut self.cloud_cover,
            Variable::WindSpeed => &mut self.wind_speed,
            Variable::DewPoint => &mut self.dew_point,
        };
        *slot = value;
    }
}

/// Current "feels like" conditions, for display only
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LiveReading {
    pub timestamp: DateTime<Utc>,
    /// Apparent temperature in Celsius
    pub apparent_temperature: f64,
}

impl LiveReading {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.apparent_temperature)
    }
}
