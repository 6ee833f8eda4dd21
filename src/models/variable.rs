//! Forecast variables and their dependency kind

use crate::error::MeteocastError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a variable can depend on other variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Estimated from its own trend model only
    Base,
    /// May combine its trend with cross-regressions on the base variables
    Derived,
}

/// A forecastable meteorological quantity.
///
/// Declaration order is the canonical column order of a forecast table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    /// Air temperature at 2 m in Celsius
    #[serde(alias = "temp")]
    Temperature,
    /// Surface pressure in hPa
    Pressure,
    /// Relative humidity at 2 m in percent
    Humidity,
    /// Precipitation probability in percent
    #[serde(alias = "precip_prob")]
    PrecipitationProbability,
    /// Cloud cover in percent
    CloudCover,
    /// Wind speed at 10 m in km/h
    WindSpeed,
    /// Dew point at 2 m in Celsius
    DewPoint,
}

impl Variable {
    /// Every variable in canonical order
    pub const ALL: [Variable; 7] = [
        Variable::Temperature,
        Variable::Pressure,
        Variable::Humidity,
        Variable::PrecipitationProbability,
        Variable::CloudCover,
        Variable::WindSpeed,
        Variable::DewPoint,
    ];

    #[must_use]
    pub fn kind(self) -> VariableKind {
        match self {
            Variable::Temperature | Variable::Pressure => VariableKind::Base,
            _ => VariableKind::Derived,
        }
    }

    #[must_use]
    pub fn is_base(self) -> bool {
        self.kind() == VariableKind::Base
    }

    /// Position in [`Variable::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used in bundle files and JSON output
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Pressure => "pressure",
            Variable::Humidity => "humidity",
            Variable::PrecipitationProbability => "precipitation_probability",
            Variable::CloudCover => "cloud_cover",
            Variable::WindSpeed => "wind_speed",
            Variable::DewPoint => "dew_point",
        }
    }

    /// Short column header with unit, for terminal tables
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Variable::Temperature => "temp °C",
            Variable::Pressure => "press hPa",
            Variable::Humidity => "hum %",
            Variable::PrecipitationProbability => "precip %",
            Variable::CloudCover => "cloud %",
            Variable::WindSpeed => "wind km/h",
            Variable::DewPoint => "dew °C",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = MeteocastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Variable::Temperature),
            "pressure" => Ok(Variable::Pressure),
            "humidity" => Ok(Variable::Humidity),
            "precipitation_probability" | "precip_prob" => Ok(Variable::PrecipitationProbability),
            "cloud_cover" => Ok(Variable::CloudCover),
            "wind_speed" => Ok(Variable::WindSpeed),
            "dew_point" => Ok(Variable::DewPoint),
            other => Err(MeteocastError::validation(format!(
                "unknown variable '{other}'"
            ))),
        }
    }
}

/// The two variables a global model can regress on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseVariable {
    Temperature,
    Pressure,
}

impl BaseVariable {
    /// Temperature first, then pressure
    pub const ALL: [BaseVariable; 2] = [BaseVariable::Temperature, BaseVariable::Pressure];
}

impl From<BaseVariable> for Variable {
    fn from(base: BaseVariable) -> Self {
        match base {
            BaseVariable::Temperature => Variable::Temperature,
            BaseVariable::Pressure => Variable::Pressure,
        }
    }
}
