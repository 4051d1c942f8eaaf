//! Integration tests for CLI config handling, request parsing and util helpers.

use churn_cli::predict::parse_request;
use churn_cli::train::{apply_overrides, load_or_default};
use churn_cli::util::validate_tsv_or_csv_file;
use churn_classifiers::config::TrainConfig;
use churn_classifiers::data_handling::Scalar;
use clap::{Arg, Command};

// ---------------------------------------------------------------------------
// validate_tsv_or_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_tsv_or_csv_file("/nonexistent/path/data.tsv").is_err());
}

// ---------------------------------------------------------------------------
// TrainConfig loading & overrides
// ---------------------------------------------------------------------------

fn train_command() -> Command {
    Command::new("train")
        .arg(Arg::new("train_data").short('d'))
        .arg(Arg::new("output_file").short('o'))
        .arg(Arg::new("schema_file").short('s'))
        .arg(Arg::new("report").long("report"))
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(Arg::new("model_type").long("model_type"))
}

#[test]
fn missing_config_path_uses_defaults() {
    assert_eq!(load_or_default(None).unwrap(), TrainConfig::default());
}

#[test]
fn partial_config_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.json");
    std::fs::write(&path, r#"{"data_path": "telco.csv", "seed": 11}"#).unwrap();

    let config = load_or_default(Some(&path)).unwrap();
    assert_eq!(config.data_path, "telco.csv");
    assert_eq!(config.seed, Some(11));
    assert_eq!(config.model_path, TrainConfig::default().model_path);
    assert_eq!(config.schema.features.len(), 5);
}

#[test]
fn unparsable_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(load_or_default(Some(&path)).is_err());
}

#[test]
fn cli_flags_override_config() {
    let matches = train_command().get_matches_from([
        "train", "-d", "in.csv", "-o", "out/model.json", "-s", "out/features.json", "--report",
        "out/report.html", "--seed", "9", "--model_type", "gbdt",
    ]);
    let mut config = TrainConfig::default();
    apply_overrides(&mut config, &matches).unwrap();

    assert_eq!(config.data_path, "in.csv");
    assert_eq!(config.model_path, "out/model.json");
    assert_eq!(config.schema_path, "out/features.json");
    assert_eq!(config.report_path.as_deref(), Some("out/report.html"));
    assert_eq!(config.seed, Some(9));
}

#[test]
fn unknown_model_type_is_rejected() {
    let matches = train_command().get_matches_from(["train", "--model_type", "forest"]);
    let mut config = TrainConfig::default();
    assert!(apply_overrides(&mut config, &matches).is_err());
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

#[test]
fn bare_and_wrapped_requests_are_equivalent() {
    let bare = parse_request(r#"{"tenure": 12, "Contract": "One year"}"#).unwrap();
    let wrapped =
        parse_request(r#"{"features": {"tenure": 12, "Contract": "One year"}}"#).unwrap();
    assert_eq!(bare, wrapped);
    assert_eq!(bare.features["tenure"], Scalar::Number(12.0));
}

#[test]
fn non_object_request_errors() {
    assert!(parse_request("[1, 2, 3]").is_err());
}
