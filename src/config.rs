//! Configuration management for `meteocast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MeteocastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest forecast horizon accepted from the config file or the command line
pub const MAX_HORIZON_HOURS: u32 = 720;

/// Root configuration structure for `meteocast`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MeteocastConfig {
    /// Forecast site
    pub location: LocationConfig,
    /// Model bundle source
    pub bundle: BundleConfig,
    /// Forecast run settings
    pub forecast: ForecastConfig,
    /// Time-series store settings
    pub store: StoreConfig,
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Site the models were trained for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// IANA zone name; forecast hours are read in this zone
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Model bundle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// JSON bundle written by the training step
    #[serde(default = "default_bundle_path")]
    pub path: String,
}

/// Forecast run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of hourly steps after the anchor
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
    /// Positivity guard of the estimate combination
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

/// Time-series store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory location
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Days of history pulled by `ingest`
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_latitude() -> f64 {
    21.0285
}

fn default_longitude() -> f64 {
    105.8542
}

fn default_timezone() -> String {
    "Asia/Bangkok".to_string()
}

fn default_bundle_path() -> String {
    "weather_models.json".to_string()
}

fn default_horizon_hours() -> u32 {
    48
}

fn default_epsilon() -> f64 {
    crate::forecast::DEFAULT_EPSILON
}

fn default_store_path() -> String {
    "~/.cache/meteocast/store".to_string()
}

fn default_lookback_days() -> u32 {
    7
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            timezone: default_timezone(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: default_bundle_path(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_hours: default_horizon_hours(),
            epsilon: default_epsilon(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lookback_days: default_lookback_days(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl MeteocastConfig {
    /// Load configuration from `config_path`, or the default location, under
    /// the `METEOCAST_` environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // METEOCAST_FORECAST__HORIZON_HOURS=24 overrides forecast.horizon_hours
        builder = builder.add_source(
            Environment::with_prefix("METEOCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MeteocastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("meteocast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.location.timezone.is_empty() {
            self.location.timezone = default_timezone();
        }
        if self.bundle.path.is_empty() {
            self.bundle.path = default_bundle_path();
        }
        if self.forecast.horizon_hours == 0 {
            self.forecast.horizon_hours = default_horizon_hours();
        }
        if self.store.path.is_empty() {
            self.store.path = default_store_path();
        }
        if self.store.lookback_days == 0 {
            self.store.lookback_days = default_lookback_days();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.location.latitude) {
            return Err(MeteocastError::config("Latitude must be between -90 and 90").into());
        }
        if !(-180.0..=180.0).contains(&self.location.longitude) {
            return Err(MeteocastError::config("Longitude must be between -180 and 180").into());
        }
        self.timezone()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.forecast.horizon_hours > MAX_HORIZON_HOURS {
            return Err(MeteocastError::config(format!(
                "Forecast horizon cannot exceed {MAX_HORIZON_HOURS} hours (30 days)"
            ))
            .into());
        }

        if !self.forecast.epsilon.is_finite() || self.forecast.epsilon <= 0.0 {
            return Err(MeteocastError::config(
                "Forecast epsilon must be a positive number"
            ).into());
        }

        if self.store.lookback_days > 92 {
            return Err(MeteocastError::config(
                "Store lookback cannot exceed 92 days"
            ).into());
        }

        if self.weather.timeout_seconds > 300 {
            return Err(MeteocastError::config(
                "Weather API timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.weather.max_retries > 10 {
            return Err(MeteocastError::config(
                "Weather API max retries cannot exceed 10"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MeteocastError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MeteocastError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        if !self.weather.base_url.starts_with("http://") && !self.weather.base_url.starts_with("https://") {
            return Err(MeteocastError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL"
            ).into());
        }

        Ok(())
    }

    /// Parsed forecast time zone
    pub fn timezone(&self) -> Result<chrono_tz::Tz> {
        self.location.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            MeteocastError::config(format!(
                "Unknown time zone '{}'",
                self.location.timezone
            ))
            .into()
        })
    }

    /// Bundle file path with `~` expanded
    #[must_use]
    pub fn bundle_path(&self) -> PathBuf {
        expand_home(&self.bundle.path)
    }

    /// Store directory with `~` expanded
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        expand_home(&self.store.path)
    }
}
