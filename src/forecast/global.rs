//! Cross-variable regression lookup

use super::evaluate_guarded;
use crate::bundle::ModelBundle;
use crate::models::{BaseVariable, Estimate, Variable};

/// Maps a base-variable estimate onto a derived variable via its global model
#[derive(Debug, Clone, Copy)]
pub struct GlobalResolver<'a> {
    bundle: &'a ModelBundle,
}

impl<'a> GlobalResolver<'a> {
    #[must_use]
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    /// Unavailable when the entry or its `which` regression is missing, or when
    /// `base_estimate` itself is unavailable. The model is never run on a missing input.
    #[must_use]
    pub fn estimate(
        &self,
        variable: Variable,
        base_estimate: Estimate,
        which: BaseVariable,
    ) -> Estimate {
        let Some(model) = self
            .bundle
            .global_model(variable)
            .and_then(|entry| entry.model_for(which))
        else {
            return Estimate::Unavailable;
        };
        let Some(x) = base_estimate.value() else {
            return Estimate::Unavailable;
        };
        let source = match which {
            BaseVariable::Temperature => "global.temp_model",
            BaseVariable::Pressure => "global.press_model",
        };
        evaluate_guarded(model, x, variable, source)
    }
}
