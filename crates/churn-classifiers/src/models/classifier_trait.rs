use ndarray::Array2;

use crate::error::Result;

/// The estimator capability used by the churn pipeline.
///
/// Labels follow the crate convention: `1` is the churn class, any other
/// code is the negative class.
pub trait ClassifierModel {
    /// Fit the model on a preprocessed design matrix.
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()>;

    /// Predict class labels using the model's own decision rule.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<i32>>;

    /// Predict the probability (0..1) of the churn class for every row.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
