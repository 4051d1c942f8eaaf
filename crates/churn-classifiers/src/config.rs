use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::GBDT {
            max_depth: 6,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::GBDT { .. } => "gbdt",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// One entry of the column alias table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AliasRule {
    /// Observed column name (compared case-insensitively after trimming).
    pub from: String,
    /// Canonical schema name it stands for.
    pub to: String,
    /// Marks a yes/no label column that only stands in for the target when
    /// the primary target column is absent.
    #[serde(default)]
    pub label_source: bool,
}

impl AliasRule {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            label_source: false,
        }
    }

    pub fn label(from: &str, to: &str) -> Self {
        Self {
            label_source: true,
            ..Self::new(from, to)
        }
    }
}

/// The canonical training schema and the renamings accepted for it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SchemaConfig {
    /// Required features, in model order.
    pub features: Vec<String>,
    /// Features that are coerced to numbers during normalization.
    pub numeric_features: Vec<String>,
    pub target: String,
    pub aliases: Vec<AliasRule>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            features: ["tenure", "MonthlyCharges", "TotalCharges", "Contract", "PaymentMethod"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numeric_features: ["tenure", "MonthlyCharges", "TotalCharges"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target: crate::schema::DEFAULT_TARGET_NAME.to_string(),
            aliases: default_aliases(),
        }
    }
}

/// Renamings seen in the public Telco churn exports and earlier tooling.
pub fn default_aliases() -> Vec<AliasRule> {
    vec![
        AliasRule::new("Tenure Months", "tenure"),
        AliasRule::new("Monthly Charges", "MonthlyCharges"),
        AliasRule::new("monthly_charges", "MonthlyCharges"),
        AliasRule::new("Total Charges", "TotalCharges"),
        AliasRule::new("total_charges", "TotalCharges"),
        AliasRule::new("contract_type", "Contract"),
        AliasRule::new("Payment Method", "PaymentMethod"),
        AliasRule::new("Churn Value", "Churn"),
        AliasRule::label("Churn Label", "Churn"),
    ]
}

/// Parameters for a training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    /// Training data (CSV or TSV). A placeholder dataset is synthesized when
    /// the file does not exist.
    pub data_path: String,
    pub model_path: String,
    pub schema_path: String,
    /// Optional HTML training report.
    pub report_path: Option<String>,
    /// Seed for placeholder data; `None` draws from entropy.
    pub seed: Option<u64>,
    pub placeholder_rows: usize,
    pub schema: SchemaConfig,
    pub model: ModelConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path: "./data/churn.csv".to_string(),
            model_path: "model.json".to_string(),
            schema_path: "model_features.json".to_string(),
            report_path: None,
            seed: None,
            placeholder_rows: 100,
            schema: SchemaConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// Load a training configuration from a JSON file.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_from_str() {
        assert_eq!("GBDT".parse::<ModelType>().unwrap().name(), "gbdt");
        assert!("random_forest".parse::<ModelType>().is_err());
    }

    #[test]
    fn partial_train_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(&path, r#"{"data_path": "telco.csv", "seed": 7}"#).unwrap();
        let config = load_train_config(&path).unwrap();
        assert_eq!(config.data_path, "telco.csv");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.schema, SchemaConfig::default());
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn train_config_json_round_trip() {
        let config = TrainConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn unreadable_config_errors() {
        assert!(load_train_config("/nonexistent/train.json").is_err());
    }
}
