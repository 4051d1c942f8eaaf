//! Error taxonomy shared by normalization, training and inference.

use thiserror::Error;

/// Errors surfaced by the churn core.
///
/// Every variant that concerns column names carries the complete list of
/// offenders, never just the first one.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Required feature or target columns could not be resolved.
    #[error("Schema mismatch: missing columns {missing:?}; available columns {available:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// The model artifact or its schema metadata could not be loaded.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// An inference request omitted required features.
    #[error("Missing features: {0:?}")]
    MissingFeatures(Vec<String>),

    /// The estimator failed while producing a prediction.
    #[error("Inference failure: {0}")]
    InferenceFailure(String),

    /// A feature schema violates its own invariants.
    #[error("Invalid feature schema: {0}")]
    InvalidSchema(String),

    /// Columns of a table disagree in length, or a row has the wrong width.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Fitting the preprocessor or estimator failed.
    #[error("Training error: {0}")]
    Training(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for churn operations
pub type Result<T> = std::result::Result<T, ChurnError>;
