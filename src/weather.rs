//! Open-Meteo client
//!
//! Supplies the hourly history the store is filled from and the live
//! "feels like" reading. Neither is consumed by the forecasting core.

use crate::config::WeatherConfig;
use crate::models::{LiveReading, Variable, WeatherRecord};
use crate::{MeteocastError, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Open-Meteo timestamps are minute-precision and, with `timezone=GMT`, in UTC
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Hourly parameters requested from Open-Meteo, per variable
fn hourly_parameter(variable: Variable) -> &'static str {
    match variable {
        Variable::Temperature => "temperature_2m",
        Variable::Pressure => "surface_pressure",
        Variable::Humidity => "relative_humidity_2m",
        Variable::PrecipitationProbability => "precipitation_probability",
        Variable::CloudCover => "cloud_cover",
        Variable::WindSpeed => "wind_speed_10m",
        Variable::DewPoint => "dew_point_2m",
    }
}

/// Hourly block of a forecast response
#[derive(Debug, Deserialize)]
pub struct HourlyResponse {
    pub hourly: HourlyData,
}

#[derive(Debug, Deserialize)]
pub struct HourlyData {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m", default)]
    pub temperature: Option<Vec<Option<f64>>>,
    #[serde(rename = "surface_pressure", default)]
    pub pressure: Option<Vec<Option<f64>>>,
    #[serde(rename = "relative_humidity_2m", default)]
    pub humidity: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub precipitation_probability: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub cloud_cover: Option<Vec<Option<f64>>>,
    #[serde(rename = "wind_speed_10m", default)]
    pub wind_speed: Option<Vec<Option<f64>>>,
    #[serde(rename = "dew_point_2m", default)]
    pub dew_point: Option<Vec<Option<f64>>>,
}

impl HourlyData {
    fn series(&self, variable: Variable) -> Option<&Vec<Option<f64>>> {
        match variable {
            Variable::Temperature => self.temperature.as_ref(),
            Variable::Pressure => self.pressure.as_ref(),
            Variable::Humidity => self.humidity.as_ref(),
            Variable::PrecipitationProbability => self.precipitation_probability.as_ref(),
            Variable::CloudCover => self.cloud_cover.as_ref(),
            Variable::WindSpeed => self.wind_speed.as_ref(),
            Variable::DewPoint => self.dew_point.as_ref(),
        }
    }
}

/// Current block of a forecast response
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub current: CurrentData,
}

#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub time: String,
    pub apparent_temperature: f64,
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert an hourly block into records, dropping rows after `now`.
///
/// Rows with an unparseable time are skipped; missing cells stay `None`.
#[must_use]
pub fn records_from_hourly(hourly: &HourlyData, now: DateTime<Utc>) -> Vec<WeatherRecord> {
    let mut records = Vec::with_capacity(hourly.time.len());
    for (idx, raw_time) in hourly.time.iter().enumerate() {
        let Some(timestamp) = parse_time(raw_time) else {
            warn!(time = %raw_time, "Skipped row with unparseable timestamp");
            continue;
        };
        if timestamp > now {
            continue;
        }
        let mut record = WeatherRecord::new(timestamp);
        for variable in Variable::ALL {
            let value = hourly
                .series(variable)
                .and_then(|series| series.get(idx).copied().flatten());
            record.set(variable, value);
        }
        records.push(record);
    }
    records
}

/// HTTP client for the Open-Meteo forecast API with transient-error retries
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a new client from the weather settings
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("meteocast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MeteocastError::api(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("OpenMeteo API request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MeteocastError::api(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeteocastError::api(format!(
                "Open-Meteo returned HTTP {status}"
            )));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| MeteocastError::api(format!("invalid response body: {e}")))?;

        let elapsed = start_time.elapsed();
        if elapsed.as_secs() > 5 {
            warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
        }
        Ok(body)
    }

    /// Current apparent temperature at the location
    #[instrument(skip(self))]
    pub async fn current_feels_like(&self, latitude: f64, longitude: f64) -> Result<LiveReading> {
        let url = format!(
            "{}/forecast?latitude={latitude}&longitude={longitude}&current=apparent_temperature&timezone=GMT",
            self.base_url
        );
        let response: CurrentResponse = self.get_json(&url).await?;
        let timestamp = parse_time(&response.current.time).ok_or_else(|| {
            MeteocastError::api(format!(
                "unparseable current time '{}'",
                response.current.time
            ))
        })?;
        Ok(LiveReading {
            timestamp,
            apparent_temperature: response.current.apparent_temperature,
        })
    }

    /// Hourly observations of the last `days` days up to `now`
    #[instrument(skip(self))]
    pub async fn recent_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<WeatherRecord>> {
        let start_date = (now - TimeDelta::days(i64::from(days))).date_naive();
        let end_date = now.date_naive();
        let parameters: Vec<&str> = Variable::ALL.into_iter().map(hourly_parameter).collect();
        let url = format!(
            "{}/forecast?latitude={latitude}&longitude={longitude}&hourly={}&timezone=GMT&start_date={start_date}&end_date={end_date}",
            self.base_url,
            parameters.join(",")
        );

        let response: HourlyResponse = self.get_json(&url).await?;
        let records = records_from_hourly(&response.hourly, now);
        info!(
            received = response.hourly.time.len(),
            kept = records.len(),
            "Fetched hourly history"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HOURLY: &str = r#"{
        "latitude": 21.0,
        "longitude": 105.875,
        "hourly": {
            "time": ["2025-04-20T05:00", "2025-04-20T06:00", "bogus", "2025-04-20T07:00"],
            "temperature_2m": [27.1, 28.4, 0.0, 29.9],
            "surface_pressure": [1009.2, null, 0.0, 1008.7],
            "relative_humidity_2m": [88, 84]
        }
    }"#;

    #[test]
    fn test_records_from_hourly() {
        let response: HourlyResponse = serde_json::from_str(HOURLY).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 4, 20, 6, 30, 0).unwrap();
        let records = records_from_hourly(&response.hourly, now);

        // the bogus row is skipped and 07:00 lies in the future
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2025, 4, 20, 5, 0, 0).unwrap());
        assert_eq!(records[0].temperature, Some(27.1));
        assert_eq!(records[0].humidity, Some(88.0));
        assert_eq!(records[1].pressure, None);
        assert_eq!(records[1].cloud_cover, None);
    }

    #[test]
    fn test_short_series_leaves_cells_empty() {
        let response: HourlyResponse = serde_json::from_str(HOURLY).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 4, 21, 0, 0, 0).unwrap();
        let records = records_from_hourly(&response.hourly, now);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].temperature, Some(29.9));
        assert_eq!(records[2].humidity, None);
    }

    #[test]
    fn test_current_response() {
        let json = r#"{"current": {"time": "2025-04-20T06:15", "interval": 900, "apparent_temperature": 33.2}}"#;
        let response: CurrentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parse_time(&response.current.time),
            Some(Utc.with_ymd_and_hms(2025, 4, 20, 6, 15, 0).unwrap())
        );
        assert_eq!(response.current.apparent_temperature, 33.2);
    }

    #[test]
    fn test_every_variable_is_requested() {
        let names: Vec<_> = Variable::ALL.into_iter().map(hourly_parameter).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"precipitation_probability"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = WeatherConfig {
            base_url: "https://api.open-meteo.com/v1/".to_string(),
            timeout_seconds: 5,
            max_retries: 1,
        };
        let client = OpenMeteoClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.open-meteo.com/v1");
    }
}
