//! Point estimates with an explicit "unavailable" marker

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of forecasting one variable at one timestamp.
///
/// Serializes as a JSON number, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Estimate {
    Value(f64),
    #[default]
    Unavailable,
}

impl Estimate {
    /// Wrap a computed value. Non-finite numbers become `Unavailable`.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Estimate::Value(value)
        } else {
            Estimate::Unavailable
        }
    }

    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Estimate::Value(v) => Some(v),
            Estimate::Unavailable => None,
        }
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        matches!(self, Estimate::Value(_))
    }

    #[must_use]
    pub fn is_unavailable(self) -> bool {
        !self.is_available()
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Value(v) => write!(f, "{v:.2}"),
            Estimate::Unavailable => f.write_str("n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_unavailable() {
        assert_eq!(Estimate::from_value(f64::NAN), Estimate::Unavailable);
        assert_eq!(Estimate::from_value(f64::INFINITY), Estimate::Unavailable);
        assert_eq!(Estimate::from_value(-3.5), Estimate::Value(-3.5));
    }

    #[test]
    fn test_json_shape() {
        assert_eq!(serde_json::to_string(&Estimate::Value(1.5)).unwrap(), "1.5");
        assert_eq!(serde_json::to_string(&Estimate::Unavailable).unwrap(), "null");
        let parsed: Estimate = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, Estimate::Unavailable);
    }

    #[test]
    fn test_display() {
        assert_eq!(Estimate::Value(19.899_7).to_string(), "19.90");
        assert_eq!(Estimate::Unavailable.to_string(), "n/a");
    }
}
