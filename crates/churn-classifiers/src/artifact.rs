//! The persisted output of training: fitted pipeline, schema and provenance.
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{default_aliases, AliasRule};
use crate::data_handling::Table;
use crate::error::Result;
use crate::io::write_json_atomic;
use crate::normalizer::TargetEncoding;
use crate::pipeline::ChurnPipeline;
use crate::schema::FeatureSchema;

/// Where a model came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub crate_version: String,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    /// Trained on synthesized placeholder rows rather than real data.
    pub placeholder_data: bool,
    pub n_rows: usize,
    pub target_encoding: TargetEncoding,
}

/// A trained pipeline together with the schema it was trained on.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub pipeline: ChurnPipeline,
    pub provenance: Provenance,
    /// Column renamings the training data was normalized with; scoring
    /// reuses them.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<AliasRule>,
}

impl ModelArtifact {
    /// Write the artifact, replacing any previous file atomically.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json_atomic(path, self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ModelArtifact> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn predict(&self, table: &Table) -> Result<Vec<i32>> {
        self.pipeline.predict(table)
    }

    pub fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        self.pipeline.predict_proba(table)
    }
}
