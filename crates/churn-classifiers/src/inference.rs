//! Serving a trained churn model.
//!
//! A `ServiceContext` is loaded once at startup and shared read-only by every
//! request. `InferenceService` keeps the outcome of that load: if it failed,
//! each call reports `ModelUnavailable` before looking at the request.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::artifact::ModelArtifact;
use crate::data_handling::{Scalar, Table};
use crate::error::{ChurnError, Result};
use crate::normalizer::{AliasTable, SchemaNormalizer};
use crate::schema::FeatureSchema;

/// Probabilities strictly above this are high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Decimal places kept in reported probabilities.
pub const PROBABILITY_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "Churn")]
    Churn,
    #[serde(rename = "No Churn")]
    NoChurn,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Churn => write!(f, "Churn"),
            Prediction::NoChurn => write!(f, "No Churn"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// Business risk tier, independent of the estimator's own label.
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Low => write!(f, "Low"),
        }
    }
}

/// Round a probability for presentation.
pub fn round_probability(probability: f64) -> f64 {
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (probability * scale).round() / scale
}

/// Body of a prediction call: feature name to value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub features: BTreeMap<String, Scalar>,
}

impl PredictionRequest {
    pub fn new(features: BTreeMap<String, Scalar>) -> Self {
        PredictionRequest { features }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Prediction,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

impl PredictionResult {
    /// Combine the estimator's label with its churn probability. The risk
    /// tier is computed on the unrounded probability.
    pub fn from_estimator(label: i32, probability: f64) -> Self {
        PredictionResult {
            prediction: if label == 1 {
                Prediction::Churn
            } else {
                Prediction::NoChurn
            },
            probability: round_probability(probability),
            risk_level: RiskLevel::from_probability(probability),
        }
    }
}

/// The model artifact and the feature schema it is served with.
#[derive(Debug)]
pub struct ServiceContext {
    artifact: ModelArtifact,
    schema: FeatureSchema,
}

impl ServiceContext {
    pub fn new(artifact: ModelArtifact) -> Self {
        if artifact.provenance.placeholder_data {
            log::warn!("Serving a model trained on placeholder data; predictions are not meaningful");
        }
        let schema = artifact.schema.clone();
        ServiceContext { artifact, schema }
    }

    /// Load the artifact and its schema metadata file. Any failure, including
    /// a schema file that disagrees with the artifact, is `ModelUnavailable`.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, schema_path: Q) -> Result<Self> {
        let model_path = model_path.as_ref();
        let schema_path = schema_path.as_ref();

        let artifact = ModelArtifact::load(model_path).map_err(|e| {
            ChurnError::ModelUnavailable(format!(
                "could not load model from {}: {}",
                model_path.display(),
                e
            ))
        })?;
        let schema = FeatureSchema::load(schema_path).map_err(|e| {
            ChurnError::ModelUnavailable(format!(
                "could not load feature metadata from {}: {}",
                schema_path.display(),
                e
            ))
        })?;
        if schema != artifact.schema {
            return Err(ChurnError::ModelUnavailable(format!(
                "feature metadata {} does not match the schema stored in {}",
                schema_path.display(),
                model_path.display()
            )));
        }

        log::info!(
            "Loaded {} model with features {:?}",
            artifact.provenance.model_type,
            schema.feature_names()
        );
        Ok(ServiceContext::new(artifact))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    fn predict_row(&self, row: &Table) -> Result<PredictionResult> {
        let labels = self.artifact.predict(row).map_err(inference_failure)?;
        let proba = self.artifact.predict_proba(row).map_err(inference_failure)?;
        match (labels.first(), proba.first()) {
            (Some(&label), Some(&probability)) => {
                Ok(PredictionResult::from_estimator(label, probability))
            }
            _ => Err(ChurnError::InferenceFailure(
                "estimator returned no output for the request row".to_string(),
            )),
        }
    }
}

fn inference_failure(error: ChurnError) -> ChurnError {
    match error {
        ChurnError::InferenceFailure(message) => ChurnError::InferenceFailure(message),
        other => ChurnError::InferenceFailure(other.to_string()),
    }
}

/// Request-per-call prediction over a shared, immutable `ServiceContext`.
#[derive(Debug, Clone)]
pub struct InferenceService {
    context: std::result::Result<Arc<ServiceContext>, String>,
}

impl InferenceService {
    pub fn new(context: ServiceContext) -> Self {
        InferenceService {
            context: Ok(Arc::new(context)),
        }
    }

    /// Keep the outcome of a startup load, successful or not.
    pub fn from_load(result: Result<ServiceContext>) -> Self {
        match result {
            Ok(context) => InferenceService::new(context),
            Err(e) => {
                log::error!("Model could not be loaded: {}", e);
                let reason = match e {
                    ChurnError::ModelUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                InferenceService {
                    context: Err(reason),
                }
            }
        }
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, schema_path: Q) -> Self {
        InferenceService::from_load(ServiceContext::load(model_path, schema_path))
    }

    pub fn is_available(&self) -> bool {
        self.context.is_ok()
    }

    pub fn context(&self) -> Result<&ServiceContext> {
        self.context
            .as_deref()
            .map_err(|reason| ChurnError::ModelUnavailable(reason.clone()))
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        self.predict_features(&request.features)
    }

    /// Validate `features` against the schema, then predict one row.
    ///
    /// Every missing feature is reported; no prediction is attempted on an
    /// incomplete request. Extra keys are ignored.
    pub fn predict_features(&self, features: &BTreeMap<String, Scalar>) -> Result<PredictionResult> {
        let context = self.context()?;
        let schema = context.schema();

        let missing: Vec<String> = schema
            .feature_names()
            .iter()
            .filter(|name| !features.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ChurnError::MissingFeatures(missing));
        }

        let row = Table::single_row(schema.feature_names(), features);
        context.predict_row(&row)
    }

    /// Normalize a whole table against the served schema, with the aliases
    /// the model was trained with, and predict every row. Rows are scored in parallel; results keep input order.
    pub fn score_table(&self, table: &Table) -> Result<Vec<PredictionResult>> {
        let context = self.context()?;
        let aliases = AliasTable::new(context.artifact().aliases.clone());
        let normalizer = SchemaNormalizer::for_schema(context.schema(), aliases);
        let normalized = normalizer.normalize(table)?;

        normalized
            .features
            .rows()
            .par_iter()
            .map(|row| context.predict_row(row))
            .collect()
    }
}
