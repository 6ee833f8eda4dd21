//! Immutable model registry
//!
//! A [`ModelBundle`] is built once, then only read. Lookups are plain array
//! indexing by variable and hour; the "has a trend / has a global model"
//! capability flags are computed when the bundle is built.

use super::model::Regressor;
use crate::models::{BaseVariable, Variable};
use crate::{MeteocastError, Result};
use std::sync::Arc;

const VARIABLES: usize = Variable::ALL.len();

/// Number of hour-of-day slots per variable
pub const HOURS_PER_DAY: usize = 24;

type SharedModel = Arc<dyn Regressor>;

/// Cross-variable regressions for one derived variable
#[derive(Debug, Clone, Default)]
pub struct GlobalModel {
    pub temp_model: Option<SharedModel>,
    pub press_model: Option<SharedModel>,
}

impl GlobalModel {
    #[must_use]
    pub fn new(temp_model: Option<SharedModel>, press_model: Option<SharedModel>) -> Self {
        Self {
            temp_model,
            press_model,
        }
    }

    /// Regression on the given base variable, if fitted
    #[must_use]
    pub fn model_for(&self, base: BaseVariable) -> Option<&dyn Regressor> {
        match base {
            BaseVariable::Temperature => self.temp_model.as_deref(),
            BaseVariable::Pressure => self.press_model.as_deref(),
        }
    }
}

/// Trend and global models produced by one training run
#[derive(Debug, Clone)]
pub struct ModelBundle {
    trend: [[Option<SharedModel>; HOURS_PER_DAY]; VARIABLES],
    global: [Option<GlobalModel>; VARIABLES],
    has_trend: [bool; VARIABLES],
}

impl ModelBundle {
    #[must_use]
    pub fn builder() -> ModelBundleBuilder {
        ModelBundleBuilder::default()
    }

    /// A bundle without any models; every forecast is unavailable
    #[must_use]
    pub fn empty() -> Self {
        Self {
            trend: std::array::from_fn(|_| std::array::from_fn(|_| None)),
            global: std::array::from_fn(|_| None),
            has_trend: [false; VARIABLES],
        }
    }

    /// Trend model for `(variable, hour)`; `None` for absent entries and hours above 23
    #[must_use]
    pub fn trend_model(&self, variable: Variable, hour: u32) -> Option<&dyn Regressor> {
        let hour = usize::try_from(hour).ok()?;
        self.trend[variable.index()]
            .get(hour)
            .and_then(|slot| slot.as_deref())
    }

    #[must_use]
    pub fn global_model(&self, variable: Variable) -> Option<&GlobalModel> {
        self.global[variable.index()].as_ref()
    }

    /// At least one hour of `variable` has a trend model
    #[must_use]
    pub fn has_trend(&self, variable: Variable) -> bool {
        self.has_trend[variable.index()]
    }

    #[must_use]
    pub fn has_global(&self, variable: Variable) -> bool {
        self.global[variable.index()].is_some()
    }

    /// The bundle carries any model for `variable`
    #[must_use]
    pub fn is_modeled(&self, variable: Variable) -> bool {
        self.has_trend(variable) || self.has_global(variable)
    }

    /// Variables with at least one trend or global entry, in canonical order
    #[must_use]
    pub fn modeled_variables(&self) -> Vec<Variable> {
        Variable::ALL
            .into_iter()
            .filter(|v| self.is_modeled(*v))
            .collect()
    }
}

/// Collects models, validates them, and freezes them into a [`ModelBundle`].
///
/// The first invalid entry is remembered and reported by [`build`](Self::build).
#[derive(Debug)]
pub struct ModelBundleBuilder {
    bundle: ModelBundle,
    error: Option<MeteocastError>,
}

impl Default for ModelBundleBuilder {
    fn default() -> Self {
        Self {
            bundle: ModelBundle::empty(),
            error: None,
        }
    }
}

impl ModelBundleBuilder {
    /// Register the trend model for `(variable, hour)`
    #[must_use]
    pub fn trend(self, variable: Variable, hour: u32, model: impl Regressor + 'static) -> Self {
        self.trend_shared(variable, hour, Arc::new(model))
    }

    #[must_use]
    pub fn trend_shared(mut self, variable: Variable, hour: u32, model: SharedModel) -> Self {
        let slot = usize::try_from(hour)
            .ok()
            .filter(|h| *h < HOURS_PER_DAY);
        match slot {
            Some(h) => self.bundle.trend[variable.index()][h] = Some(model),
            None => self.fail(format!(
                "trend model for {variable} has hour {hour}, expected 0..=23"
            )),
        }
        self
    }

    /// Register the global entry for a derived variable
    #[must_use]
    pub fn global(
        self,
        variable: Variable,
        temp_model: Option<SharedModel>,
        press_model: Option<SharedModel>,
    ) -> Self {
        self.global_entry(variable, GlobalModel::new(temp_model, press_model))
    }

    #[must_use]
    pub fn global_entry(mut self, variable: Variable, entry: GlobalModel) -> Self {
        if variable.is_base() {
            self.fail(format!(
                "base variable {variable} cannot have a global model"
            ));
        } else {
            self.bundle.global[variable.index()] = Some(entry);
        }
        self
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(MeteocastError::bundle(message));
        }
    }

    pub fn build(mut self) -> Result<ModelBundle> {
        if let Some(err) = self.error {
            return Err(err);
        }
        for variable in Variable::ALL {
            self.bundle.has_trend[variable.index()] =
                self.bundle.trend[variable.index()].iter().any(Option::is_some);
        }
        Ok(self.bundle)
    }
}
