use anyhow::Result;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use churn_cli::predict::{parse_request, read_request, run_prediction};
use churn_cli::score::run_scoring;
use churn_cli::train::{apply_overrides, load_or_default, run_training};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CHURN_LOG", "error,churn=info"))
        .init();

    let matches = Command::new("churn")
        .version(clap::crate_version!())
        .about("Churn CLI - train and serve customer churn classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a churn model and write the model artifact and feature metadata")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file (JSON). Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training CSV/TSV. Overrides the data path \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("File the model artifact will be written to.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("schema_file")
                        .short('s')
                        .long("schema_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("File the feature metadata will be written to.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Write an HTML training report to this path.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seed for placeholder data generation."),
                )
                .arg(
                    Arg::new("model_type")
                        .short('m')
                        .long("model_type")
                        .help("Estimator to train. Overrides the model type in the configuration file.")
                        .value_parser(["gbdt"]),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict churn for a single customer")
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Path to the model artifact (JSON).")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("schema")
                        .short('s')
                        .long("schema")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Path to the feature metadata file (JSON).")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("request")
                        .short('r')
                        .long("request")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("JSON file holding the request body.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("features")
                        .short('f')
                        .long("features")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Inline JSON object of feature values."),
                )
                .group(
                    ArgGroup::new("input")
                        .args(["request", "features"])
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("score")
                .about("Score every row of a CSV/TSV file")
                .arg(
                    Arg::new("data")
                        .help("Path to the input CSV/TSV file.")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Path to the model artifact (JSON).")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("schema")
                        .short('s')
                        .long("schema")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Path to the feature metadata file (JSON).")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Where to write the scored CSV. Defaults to stdout.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Do not print the completion message."),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("score", sub_m)) => handle_score(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[Churn::Train] Training from config: {:?}", path),
        None => eprintln!("[Churn::Train] No config file provided; using defaults."),
    }

    let mut config = load_or_default(config_path)?;
    apply_overrides(&mut config, matches)?;

    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[Churn::Train] Default config:\n{}", default_json);
    }

    match run_training(&config) {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let model_path: &PathBuf = matches.get_one("model").unwrap();
    let schema_path: &PathBuf = matches.get_one("schema").unwrap();

    let request = match (
        matches.get_one::<PathBuf>("request"),
        matches.get_one::<String>("features"),
    ) {
        (Some(path), _) => read_request(path),
        (None, Some(inline)) => parse_request(inline),
        (None, None) => unreachable!("Request input is required by CLI configuration"),
    };

    match request.and_then(|request| run_prediction(model_path, schema_path, &request)) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_score(matches: &ArgMatches) -> Result<()> {
    let data_path: &String = matches.get_one("data").unwrap();
    let model_path: &PathBuf = matches.get_one("model").unwrap();
    let schema_path: &PathBuf = matches.get_one("schema").unwrap();
    let output_path: Option<&PathBuf> = matches.get_one("output_file");

    match run_scoring(model_path, schema_path, data_path, output_path) {
        Ok(rows) => {
            if !matches.get_flag("quiet") {
                eprintln!("[Churn::Score] Completed scoring {} rows.", rows);
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Scoring failed: {:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(1)
        }
    }
}
