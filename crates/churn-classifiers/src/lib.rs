//! churn-classifiers: customer churn prediction from heterogeneous tabular data.
//!
//! The crate reconciles datasets whose column names drift from the canonical
//! churn schema (`normalizer`), trains a preprocessing + gradient boosting
//! pipeline on them (`training`), and serves the persisted model behind a
//! request/response interface (`inference`). Tables are read from CSV/TSV
//! (`io`) and training runs can emit an HTML report (`report`).
pub mod artifact;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod inference;
pub mod io;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod schema;
pub mod stats;
pub mod training;

pub use error::{ChurnError, Result};
