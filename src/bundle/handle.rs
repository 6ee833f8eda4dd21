//! Swappable reference to the current model bundle

use super::registry::ModelBundle;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared slot holding the bundle that new forecasts should use.
///
/// Readers take an `Arc` snapshot, so a forecast that started before a
/// [`replace`](Self::replace) keeps running against the old bundle in full.
#[derive(Debug, Clone)]
pub struct BundleHandle {
    slot: Arc<RwLock<Arc<ModelBundle>>>,
}

impl BundleHandle {
    #[must_use]
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(bundle))),
        }
    }

    /// Snapshot of the current bundle
    #[must_use]
    pub fn current(&self) -> Arc<ModelBundle> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install a new bundle and return the previous one
    pub fn replace(&self, bundle: ModelBundle) -> Arc<ModelBundle> {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::LinearModel;
    use crate::models::Variable;

    fn bundle_with(value: f64) -> ModelBundle {
        ModelBundle::builder()
            .trend(Variable::Temperature, 0, LinearModel::constant(value))
            .build()
            .unwrap()
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = BundleHandle::new(bundle_with(1.0));
        let before = handle.current();

        let previous = handle.replace(bundle_with(2.0));
        let after = handle.current();

        assert!(Arc::ptr_eq(&before, &previous));
        let old = before.trend_model(Variable::Temperature, 0).unwrap();
        let new = after.trend_model(Variable::Temperature, 0).unwrap();
        assert_eq!(old.evaluate(0.0).unwrap(), 1.0);
        assert_eq!(new.evaluate(0.0).unwrap(), 2.0);
    }

    #[test]
    fn test_clones_share_slot() {
        let handle = BundleHandle::new(ModelBundle::empty());
        let other = handle.clone();
        other.replace(bundle_with(5.0));
        assert!(handle.current().has_trend(Variable::Temperature));
    }
}
