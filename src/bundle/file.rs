//! JSON bundle files written by the training pipeline
//!
//! ```json
//! {
//!   "trend_models": { "temperature": { "0": {"slope": 0.01, "intercept": 24.0}, "1": null } },
//!   "global_models": { "humidity": { "temp_model": {"slope": -2.0, "intercept": 130.0}, "press_model": null } }
//! }
//! ```

use super::model::{LinearModel, Regressor};
use super::registry::{GlobalModel, ModelBundle};
use crate::models::Variable;
use crate::{MeteocastError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Default, Deserialize)]
struct BundleFile {
    #[serde(default)]
    trend_models: BTreeMap<String, BTreeMap<String, Option<LinearModel>>>,
    #[serde(default)]
    global_models: BTreeMap<String, GlobalModelFile>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalModelFile {
    #[serde(default)]
    temp_model: Option<LinearModel>,
    #[serde(default)]
    press_model: Option<LinearModel>,
}

fn parse_variable(section: &str, name: &str) -> Result<Variable> {
    name.parse::<Variable>()
        .map_err(|_| MeteocastError::bundle(format!("{section}: unknown variable '{name}'")))
}

fn parse_hour(variable: Variable, key: &str) -> Result<u32> {
    key.trim().parse::<u32>().map_err(|_| {
        MeteocastError::bundle(format!(
            "trend_models.{variable}: hour key '{key}' is not an integer"
        ))
    })
}

impl ModelBundle {
    /// Parse a bundle from its JSON representation
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: BundleFile = serde_json::from_str(json)?;
        let mut builder = ModelBundle::builder();

        for (name, hours) in &file.trend_models {
            let variable = parse_variable("trend_models", name)?;
            for (key, model) in hours {
                let hour = parse_hour(variable, key)?;
                if let Some(model) = model {
                    builder = builder.trend(variable, hour, *model);
                } else {
                    debug!(%variable, hour, "Trend slot present but empty");
                }
            }
        }

        for (name, entry) in &file.global_models {
            let variable = parse_variable("global_models", name)?;
            builder = builder.global_entry(
                variable,
                GlobalModel::new(
                    entry.temp_model.map(|m| Arc::new(m) as Arc<dyn Regressor>),
                    entry.press_model.map(|m| Arc::new(m) as Arc<dyn Regressor>),
                ),
            );
        }

        builder.build()
    }

    /// Read a bundle file from disk
    #[instrument(name = "load_bundle", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MeteocastError::bundle(format!("cannot read {}: {e}", path.display()))
        })?;
        let bundle = Self::from_json_str(&json)?;
        info!(
            variables = bundle.modeled_variables().len(),
            "Loaded model bundle"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "trend_models": {
            "temperature": { "0": {"slope": 0.0, "intercept": 20.0}, "1": null },
            "temp": { "2": {"slope": 0.0, "intercept": 21.0} },
            "precip_prob": { "5": {"slope": 0.0, "intercept": 40.0} }
        },
        "global_models": {
            "humidity": { "temp_model": {"slope": -2.0, "intercept": 130.0} },
            "cloud_cover": { "temp_model": null, "press_model": null }
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let bundle = ModelBundle::from_json_str(SAMPLE).unwrap();
        assert!(bundle.trend_model(Variable::Temperature, 0).is_some());
        assert!(bundle.trend_model(Variable::Temperature, 2).is_some());
        assert!(bundle.trend_model(Variable::Temperature, 1).is_none());
        assert!(bundle.has_trend(Variable::PrecipitationProbability));

        let humidity = bundle.global_model(Variable::Humidity).unwrap();
        assert!(humidity.temp_model.is_some());
        assert!(humidity.press_model.is_none());
        assert!(bundle.has_global(Variable::CloudCover));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let bundle = ModelBundle::from_json_str("{}").unwrap();
        assert!(bundle.modeled_variables().is_empty());
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let err = ModelBundle::from_json_str(r#"{"trend_models": {"fog": {}}}"#).unwrap_err();
        assert!(matches!(err, MeteocastError::Bundle { .. }));
        assert!(err.to_string().contains("fog"));
    }

    #[test]
    fn test_bad_hour_key_rejected() {
        let json = r#"{"trend_models": {"pressure": {"noon": {"slope": 0, "intercept": 1}}}}"#;
        assert!(ModelBundle::from_json_str(json).is_err());

        let json = r#"{"trend_models": {"pressure": {"30": {"slope": 0, "intercept": 1}}}}"#;
        assert!(ModelBundle::from_json_str(json).is_err());
    }

    #[test]
    fn test_malformed_json_is_bundle_error() {
        let err = ModelBundle::from_json_str("{\"trend_models\": [").unwrap_err();
        assert!(matches!(err, MeteocastError::Bundle { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let bundle = ModelBundle::load(file.path()).unwrap();
        assert!(bundle.is_modeled(Variable::Humidity));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelBundle::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
