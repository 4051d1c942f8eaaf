use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;

/// Serializable set of estimators that can live inside a model artifact.
#[derive(Serialize, Deserialize)]
pub enum Estimator {
    GBDT(GBDTClassifier),
}

/// Build an untrained estimator from a `ModelConfig`.
pub fn build_model(params: ModelConfig) -> Estimator {
    match params.model_type {
        ModelType::GBDT { .. } => Estimator::GBDT(GBDTClassifier::new(params)),
    }
}

impl ClassifierModel for Estimator {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        match self {
            Estimator::GBDT(model) => model.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>> {
        match self {
            Estimator::GBDT(model) => model.predict(x),
        }
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        match self {
            Estimator::GBDT(model) => model.predict_proba(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Estimator::GBDT(model) => model.name(),
        }
    }
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Estimator").field(&self.name()).finish()
    }
}
