pub mod classifier_trait;
pub mod factory;
pub mod gbdt;

pub use classifier_trait::ClassifierModel;
pub use factory::{build_model, Estimator};
