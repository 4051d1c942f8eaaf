//! Training: normalize a raw dataset, fit the pipeline, persist the results.
use std::path::Path;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::artifact::{ModelArtifact, Provenance};
use crate::config::TrainConfig;
use crate::data_handling::{Column, Scalar, Table};
use crate::error::{ChurnError, Result};
use crate::io::read_table;
use crate::normalizer::{NormalizedTable, SchemaNormalizer};
use crate::pipeline::ChurnPipeline;
use crate::report::write_training_report;
use crate::schema::FeatureSchema;
use crate::stats::TrainingMetrics;

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const PAYMENT_METHODS: [&str; 3] = ["Electronic check", "Mailed check", "Bank transfer"];

/// Everything produced by a training run.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub normalized: NormalizedTable,
    pub metrics: TrainingMetrics,
    /// Churn probability of every training row.
    pub training_proba: Vec<f64>,
}

impl TrainingOutcome {
    pub fn schema(&self) -> &FeatureSchema {
        &self.artifact.schema
    }
}

pub struct TrainingPipeline {
    config: TrainConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainConfig) -> Self {
        TrainingPipeline { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Load the configured dataset, or synthesize placeholder rows when it
    /// does not exist. The flag tells whether the rows are placeholders.
    pub fn load_data(&self) -> Result<(Table, bool)> {
        let path = Path::new(&self.config.data_path);
        if path.exists() {
            log::info!("Loading training data from {}", path.display());
            return Ok((read_table(path)?, false));
        }

        log::warn!(
            "{} not found; synthesizing {} placeholder rows. \
             The resulting model is for pipeline checks only.",
            path.display(),
            self.config.placeholder_rows
        );
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let table = synthesize_placeholder(
            self.config.placeholder_rows,
            &self.config.schema.target,
            &mut rng,
        )?;
        Ok((table, true))
    }

    /// Train on a real dataset.
    pub fn train(&self, raw: &Table) -> Result<TrainingOutcome> {
        self.fit(raw, false)
    }

    /// Normalize `raw`, derive the feature schema and fit the pipeline.
    pub fn fit(&self, raw: &Table, placeholder_data: bool) -> Result<TrainingOutcome> {
        let normalizer = SchemaNormalizer::from_config(&self.config.schema);
        let normalized = normalizer.normalize(raw)?;
        let target = normalized
            .target
            .as_ref()
            .ok_or_else(|| ChurnError::Training("normalizer returned no target".to_string()))?;

        let distinct = {
            let mut labels = target.labels.clone();
            labels.sort_unstable();
            labels.dedup();
            labels.len()
        };
        if distinct < 2 {
            return Err(ChurnError::Training(format!(
                "target '{}' has a single class; both churn and non-churn rows are required",
                target.name
            )));
        }

        let schema = FeatureSchema::from_table(&normalized.features, target.name.clone())?;
        log::info!(
            "Training with features {:?} (numeric {:?}, categorical {:?})",
            schema.feature_names(),
            schema.numeric_features(),
            schema.categorical_features()
        );

        let pipeline =
            ChurnPipeline::fit(&normalized.features, &target.labels, &schema, &self.config.model)?;

        let training_proba = pipeline.predict_proba(&normalized.features)?;
        let predicted = pipeline.predict(&normalized.features)?;
        let metrics = TrainingMetrics::compute(&target.labels, &predicted, &training_proba);
        log::info!(
            "Training accuracy {:.4}, ROC AUC {}",
            metrics.accuracy,
            metrics
                .roc_auc
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "n/a".to_string())
        );

        let provenance = Provenance {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            model_type: self.config.model.model_type.name().to_string(),
            trained_at: Utc::now(),
            placeholder_data,
            n_rows: normalized.features.nrows(),
            target_encoding: target.encoding.clone(),
        };

        Ok(TrainingOutcome {
            artifact: ModelArtifact {
                schema,
                pipeline,
                provenance,
                aliases: self.config.schema.aliases.clone(),
            },
            normalized,
            metrics,
            training_proba,
        })
    }

    /// Write the model artifact and the schema metadata file.
    pub fn persist(&self, outcome: &TrainingOutcome) -> Result<()> {
        outcome.artifact.store(&self.config.model_path)?;
        outcome.schema().store(&self.config.schema_path)?;
        log::info!(
            "Saved model to {} and feature metadata to {}",
            self.config.model_path,
            self.config.schema_path
        );
        Ok(())
    }

    /// Load data, train, optionally write the HTML report, then persist.
    ///
    /// The report goes first so that a failure there leaves any previous
    /// model and schema files untouched.
    pub fn run(&self) -> Result<TrainingOutcome> {
        let (raw, placeholder) = self.load_data()?;
        let outcome = self.fit(&raw, placeholder)?;
        if let Some(report_path) = &self.config.report_path {
            write_training_report(&outcome, report_path)?;
            log::info!("Training report written to {}", report_path);
        }
        self.persist(&outcome)?;
        Ok(outcome)
    }
}

/// Build a dataset with canonical churn columns and independently random
/// Yes/No labels. Only useful for exercising the pipeline.
pub fn synthesize_placeholder<R: Rng>(rows: usize, target: &str, rng: &mut R) -> Result<Table> {
    let mut tenure = Vec::with_capacity(rows);
    let mut monthly = Vec::with_capacity(rows);
    let mut total = Vec::with_capacity(rows);
    let mut contract = Vec::with_capacity(rows);
    let mut payment = Vec::with_capacity(rows);
    let mut churn = Vec::with_capacity(rows);

    for _ in 0..rows {
        tenure.push(Some(Scalar::Number(rng.gen_range(1..72) as f64)));
        monthly.push(Some(Scalar::Number(rng.gen_range(20.0..120.0))));
        total.push(Some(Scalar::Number(rng.gen_range(20.0..5000.0))));
        contract.push(CONTRACTS.choose(rng).map(|s| Scalar::from(*s)));
        payment.push(PAYMENT_METHODS.choose(rng).map(|s| Scalar::from(*s)));
        let label = if rng.gen_bool(0.5) { "Yes" } else { "No" };
        churn.push(Some(Scalar::from(label)));
    }

    Table::from_columns(vec![
        Column::new("tenure", tenure),
        Column::new("MonthlyCharges", monthly),
        Column::new("TotalCharges", total),
        Column::new("Contract", contract),
        Column::new("PaymentMethod", payment),
        Column::new(target, churn),
    ])
}
