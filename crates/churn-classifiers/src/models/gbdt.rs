use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::{ChurnError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Serialize, Deserialize)]
pub struct GBDTClassifier {
    model: Option<GBDT>,
    params: ModelConfig,
    feature_size: usize,
    /// Probability at or above which `predict` reports the churn class.
    threshold: f32,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GBDTClassifier {
            model: None,
            params,
            feature_size: 0,
            threshold: 0.5,
        }
    }

    fn to_data(x: &Array2<f32>, labels: Option<&[i32]>) -> DataVec {
        let mut data = DataVec::with_capacity(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            // log-likelihood loss expects labels in {-1, 1}
            let label = match labels {
                Some(y) if y[i] == 1 => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
            data.push(Data::new_training_data(row.to_vec(), 1.0, label, None));
        }
        data
    }

    fn trained(&self, x: &Array2<f32>) -> Result<&GBDT> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ChurnError::InferenceFailure("GBDT model is not trained".to_string()))?;
        if x.ncols() != self.feature_size {
            return Err(ChurnError::InferenceFailure(format!(
                "GBDT model expects {} features, got {}",
                self.feature_size,
                x.ncols()
            )));
        }
        Ok(model)
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ChurnError::Training(format!(
                "GBDT needs matching non-empty inputs, got {} rows and {} labels",
                x.nrows(),
                y.len()
            )));
        }
        let feature_size = x.ncols();

        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();

                config.set_feature_size(feature_size);
                config.set_shrinkage(self.params.learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);
                let mut train_x = Self::to_data(x, Some(y));
                gbdt.fit(&mut train_x);

                self.model = Some(gbdt);
                self.feature_size = feature_size;
            }
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .into_iter()
            .map(|p| if p >= self.threshold { 1 } else { 0 })
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self.trained(x)?;
        let test_x = Self::to_data(x, None);
        let predictions = model.predict(&test_x);
        Ok(predictions
            .into_iter()
            .map(|p| if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.5 })
            .collect())
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Array2<f32>, Vec<i32>) {
        // the first feature separates the classes
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                2.0, 0.1, -2.0, 0.2, 1.8, -0.1, -1.9, 0.0, 2.2, 0.3, -2.1, -0.2, 1.9, 0.1, -2.2,
                0.2,
            ],
        )
        .unwrap();
        let y = vec![1, 0, 1, 0, 1, 0, 1, 0];
        (x, y)
    }

    fn params() -> ModelConfig {
        ModelConfig {
            learning_rate: 0.1,
            model_type: ModelType::GBDT {
                max_depth: 3,
                num_boost_round: 20,
                debug: false,
                training_optimization_level: 2,
                loss_type: "LogLikelyhood".to_string(),
            },
        }
    }

    #[test]
    fn test_gbdt_classifier() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(params());
        classifier.fit(&x, &y).unwrap();

        let proba = classifier.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), y.len());
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

        let labels = classifier.predict(&x).unwrap();
        assert!(labels.iter().all(|l| *l == 0 || *l == 1));
    }

    #[test]
    fn untrained_model_reports_failure() {
        let (x, _) = toy_data();
        let classifier = GBDTClassifier::new(params());
        assert!(matches!(
            classifier.predict_proba(&x),
            Err(ChurnError::InferenceFailure(_))
        ));
    }

    #[test]
    fn feature_count_mismatch_is_rejected() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(params());
        classifier.fit(&x, &y).unwrap();
        let narrow = Array2::<f32>::zeros((1, 1));
        assert!(classifier.predict(&narrow).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_predictions() {
        let (x, y) = toy_data();
        let mut classifier = GBDTClassifier::new(params());
        classifier.fit(&x, &y).unwrap();
        let json = serde_json::to_string(&classifier).unwrap();
        let restored: GBDTClassifier = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.predict_proba(&x).unwrap(),
            classifier.predict_proba(&x).unwrap()
        );
    }
}
