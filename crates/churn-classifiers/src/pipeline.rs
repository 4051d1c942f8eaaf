//! Preprocessor and estimator composed into a single table-level model.
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::data_handling::Table;
use crate::error::{ChurnError, Result};
use crate::models::{build_model, ClassifierModel, Estimator};
use crate::preprocessing::Preprocessor;
use crate::schema::FeatureSchema;

/// A fitted preprocessor followed by a fitted estimator.
///
/// Callers hand it tables whose columns are named per the feature schema;
/// column order does not matter.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChurnPipeline {
    preprocessor: Preprocessor,
    estimator: Estimator,
}

impl ChurnPipeline {
    /// Fit preprocessing and the configured estimator on normalized features
    /// and encoded labels.
    pub fn fit(
        features: &Table,
        labels: &[i32],
        schema: &FeatureSchema,
        model: &ModelConfig,
    ) -> Result<ChurnPipeline> {
        if labels.len() != features.nrows() {
            return Err(ChurnError::Training(format!(
                "{} labels for {} rows",
                labels.len(),
                features.nrows()
            )));
        }

        let preprocessor = Preprocessor::fit(features, schema)?;
        let x = preprocessor.transform(features)?;

        let mut estimator = build_model(model.clone());
        log::info!(
            "Fitting {} on {} rows x {} encoded features",
            estimator.name(),
            x.nrows(),
            x.ncols()
        );
        estimator.fit(&x, labels)?;

        Ok(ChurnPipeline {
            preprocessor,
            estimator,
        })
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Class labels from the estimator's own decision rule.
    pub fn predict(&self, table: &Table) -> Result<Vec<i32>> {
        let x = self.preprocessor.transform(table)?;
        self.estimator.predict(&x)
    }

    /// Probability of the churn class for every row.
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let x = self.preprocessor.transform(table)?;
        Ok(self
            .estimator
            .predict_proba(&x)?
            .into_iter()
            .map(f64::from)
            .collect())
    }
}
