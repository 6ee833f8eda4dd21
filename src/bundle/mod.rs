//! Model bundle: the read-only output of an external training run
//!
//! - Model: the [`Regressor`] evaluation seam and the fitted [`LinearModel`]
//! - Registry: the immutable [`ModelBundle`] and its builder
//! - File: JSON loading
//! - Handle: atomic replacement of the bundle between requests

pub mod file;
pub mod handle;
pub mod model;
pub mod registry;

pub use handle::BundleHandle;
pub use model::{LinearModel, Regressor};
pub use registry::{GlobalModel, HOURS_PER_DAY, ModelBundle, ModelBundleBuilder};
