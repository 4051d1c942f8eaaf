//! `churn train`: build a `TrainConfig` from a JSON file plus CLI overrides
//! and run the training pipeline.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Serialize;

use churn_classifiers::config::{load_train_config, ModelType, TrainConfig};
use churn_classifiers::schema::FeatureSchema;
use churn_classifiers::stats::TrainingMetrics;
use churn_classifiers::training::TrainingPipeline;

/// What `churn train` prints on success.
#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub model_path: String,
    pub schema_path: String,
    pub report_path: Option<String>,
    pub placeholder_data: bool,
    pub schema: FeatureSchema,
    pub metrics: TrainingMetrics,
}

/// Load the config file, or fall back to defaults when none is given.
pub fn load_or_default(config_path: Option<&PathBuf>) -> Result<TrainConfig> {
    match config_path {
        Some(path) => load_train_config(path),
        None => Ok(TrainConfig::default()),
    }
}

/// Apply `-d/-o/-s/--report/--seed/--model_type` on top of `config`.
pub fn apply_overrides(config: &mut TrainConfig, matches: &ArgMatches) -> Result<()> {
    if let Some(data) = matches.get_one::<String>("train_data") {
        config.data_path = data.clone();
    }
    if let Some(output) = matches.get_one::<String>("output_file") {
        config.model_path = output.clone();
    }
    if let Some(schema) = matches.get_one::<String>("schema_file") {
        config.schema_path = schema.clone();
    }
    if let Some(report) = matches.get_one::<String>("report") {
        config.report_path = Some(report.clone());
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(model_type) = matches.get_one::<String>("model_type") {
        config.model.model_type = model_type
            .parse::<ModelType>()
            .map_err(anyhow::Error::msg)?;
    }
    Ok(())
}

pub fn run_training(config: &TrainConfig) -> Result<TrainSummary> {
    let outcome = TrainingPipeline::new(config.clone())
        .run()
        .context("Training failed")?;

    Ok(TrainSummary {
        model_path: config.model_path.clone(),
        schema_path: config.schema_path.clone(),
        report_path: config.report_path.clone(),
        placeholder_data: outcome.artifact.provenance.placeholder_data,
        schema: outcome.schema().clone(),
        metrics: outcome.metrics,
    })
}
