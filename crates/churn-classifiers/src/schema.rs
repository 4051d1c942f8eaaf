//! The canonical feature schema a model is trained on and served with.
use std::collections::HashSet;
use std::convert::TryFrom;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data_handling::Table;
use crate::error::{ChurnError, Result};
use crate::io::write_json_atomic;

/// Target column name used when a metadata file does not name one.
pub const DEFAULT_TARGET_NAME: &str = "Churn";

/// Ordered feature names, partitioned into numeric and categorical subsets,
/// plus the canonical target name.
///
/// Constructed once at training time and read-only afterwards. The
/// constructor (and deserialization) reject schemas whose partition does not
/// cover `feature_names` exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRecord", into = "SchemaRecord")]
pub struct FeatureSchema {
    feature_names: Vec<String>,
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    target_name: String,
}

/// On-disk form of `FeatureSchema` (`model_features.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaRecord {
    feature_names: Vec<String>,
    numeric: Vec<String>,
    categorical: Vec<String>,
    #[serde(default = "default_target_name")]
    target: String,
}

fn default_target_name() -> String {
    DEFAULT_TARGET_NAME.to_string()
}

impl FeatureSchema {
    pub fn new(
        feature_names: Vec<String>,
        numeric_features: Vec<String>,
        categorical_features: Vec<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        let target_name = target_name.into();

        let mut seen = HashSet::new();
        if let Some(dup) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ChurnError::InvalidSchema(format!(
                "duplicate feature name '{}'",
                dup
            )));
        }
        if seen.contains(target_name.as_str()) {
            return Err(ChurnError::InvalidSchema(format!(
                "target '{}' is also listed as a feature",
                target_name
            )));
        }

        let numeric: HashSet<&str> = numeric_features.iter().map(String::as_str).collect();
        let categorical: HashSet<&str> = categorical_features.iter().map(String::as_str).collect();

        if let Some(both) = numeric.intersection(&categorical).next() {
            return Err(ChurnError::InvalidSchema(format!(
                "feature '{}' is both numeric and categorical",
                both
            )));
        }
        let partition: HashSet<&str> = numeric.union(&categorical).copied().collect();
        if partition != seen
            || numeric.len() != numeric_features.len()
            || categorical.len() != categorical_features.len()
        {
            return Err(ChurnError::InvalidSchema(
                "numeric and categorical features must partition feature_names".to_string(),
            ));
        }

        Ok(FeatureSchema {
            feature_names,
            numeric_features,
            categorical_features,
            target_name,
        })
    }

    /// Derive a schema from a normalized feature table: a feature is numeric
    /// iff every one of its values is a number.
    pub fn from_table(features: &Table, target_name: impl Into<String>) -> Result<Self> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for column in features.columns() {
            if column.is_numeric() {
                numeric.push(column.name.clone());
            } else {
                categorical.push(column.name.clone());
            }
        }
        FeatureSchema::new(features.column_names(), numeric, categorical, target_name)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_features.iter().any(|n| n == name)
    }

    /// Write the schema metadata file, replacing any previous one atomically.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json_atomic(path, self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl TryFrom<SchemaRecord> for FeatureSchema {
    type Error = ChurnError;

    fn try_from(record: SchemaRecord) -> Result<Self> {
        FeatureSchema::new(
            record.feature_names,
            record.numeric,
            record.categorical,
            record.target,
        )
    }
}

impl From<FeatureSchema> for SchemaRecord {
    fn from(schema: FeatureSchema) -> Self {
        SchemaRecord {
            feature_names: schema.feature_names,
            numeric: schema.numeric_features,
            categorical: schema.categorical_features,
            target: schema.target_name,
        }
    }
}
