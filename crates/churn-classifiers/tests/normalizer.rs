//! Integration tests for column-name reconciliation and target encoding.

use churn_classifiers::config::SchemaConfig;
use churn_classifiers::data_handling::{Column, Scalar, Table};
use churn_classifiers::error::ChurnError;
use churn_classifiers::normalizer::{NameRule, SchemaNormalizer, TargetEncoding};

fn text(values: &[&str]) -> Vec<Option<Scalar>> {
    values.iter().map(|v| Some(Scalar::from(*v))).collect()
}

fn numbers(values: &[f64]) -> Vec<Option<Scalar>> {
    values.iter().map(|v| Some(Scalar::Number(*v))).collect()
}

/// A Telco-style export: spaced headers and a "Churn Value" target.
fn telco_export() -> Table {
    Table::from_columns(vec![
        Column::new("CustomerID", text(&["a", "b", "c"])),
        Column::new("Tenure Months", numbers(&[1.0, 24.0, 60.0])),
        Column::new("Monthly Charges", numbers(&[70.5, 20.0, 99.9])),
        Column::new("Total Charges", text(&["70.5", "480", " "])),
        Column::new("Contract", text(&["Month-to-month", "One year", "Two year"])),
        Column::new("Payment Method", text(&["Electronic check", "Mailed check", "Bank transfer"])),
        Column::new("Churn Value", numbers(&[1.0, 0.0, 0.0])),
    ])
    .unwrap()
}

fn normalizer() -> SchemaNormalizer {
    SchemaNormalizer::from_config(&SchemaConfig::default())
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

#[test]
fn telco_headers_resolve_to_canonical_names() {
    let normalized = normalizer().normalize(&telco_export()).unwrap();
    assert_eq!(
        normalized.features.column_names(),
        vec!["tenure", "MonthlyCharges", "TotalCharges", "Contract", "PaymentMethod"]
    );

    let tenure = normalized
        .resolutions
        .iter()
        .find(|r| r.canonical == "tenure")
        .unwrap();
    assert_eq!(tenure.observed, "Tenure Months");
    assert_eq!(tenure.rule, NameRule::Alias);
    assert_eq!(
        normalized.features.column("tenure").unwrap().numbers().unwrap(),
        vec![1.0, 24.0, 60.0]
    );

    let target = normalized.target.as_ref().unwrap();
    assert_eq!(target.name, "Churn");
    assert_eq!(target.labels, vec![1, 0, 0]);
}

#[test]
fn unrelated_columns_are_dropped() {
    let normalized = normalizer().normalize(&telco_export()).unwrap();
    assert!(normalized.features.column("CustomerID").is_none());
    assert!(normalized.features.column("Churn").is_none());
}

#[test]
fn spelling_variants_use_the_first_matching_rule() {
    let table = Table::from_columns(vec![
        Column::new(" tenure ", numbers(&[3.0, 4.0])),
        Column::new("MonthlyCharges", numbers(&[10.0, 11.0])),
        Column::new("TotalCharges", numbers(&[30.0, 44.0])),
        Column::new("contract", text(&["One year", "Two year"])),
        Column::new("Payment  Method", text(&["Mailed check", "Bank transfer"])),
        Column::new("Churn", text(&["Yes", "No"])),
    ])
    .unwrap();
    let normalized = normalizer().normalize(&table).unwrap();
    let rule_of = |name: &str| {
        normalized
            .resolutions
            .iter()
            .find(|r| r.canonical == name)
            .map(|r| r.rule)
            .unwrap()
    };
    assert_eq!(rule_of("tenure"), NameRule::Verbatim);
    assert_eq!(rule_of("Contract"), NameRule::CaseInsensitive);
    assert_eq!(rule_of("PaymentMethod"), NameRule::Compact);
}

#[test]
fn label_column_stands_in_for_missing_target() {
    let table = Table::from_columns(vec![
        Column::new("tenure", numbers(&[3.0, 4.0])),
        Column::new("MonthlyCharges", numbers(&[10.0, 11.0])),
        Column::new("TotalCharges", numbers(&[30.0, 44.0])),
        Column::new("Contract", text(&["One year", "Two year"])),
        Column::new("PaymentMethod", text(&["Mailed check", "Bank transfer"])),
        Column::new("Churn Label", text(&["No", "Yes"])),
    ])
    .unwrap();
    let normalized = normalizer().normalize(&table).unwrap();
    let target = normalized.target.unwrap();
    assert_eq!(target.labels, vec![0, 1]);
    assert_eq!(target.encoding, TargetEncoding::Primary);
    let resolution = normalized.resolutions.last().unwrap();
    assert_eq!(resolution.observed, "Churn Label");
    assert_eq!(resolution.rule, NameRule::LabelVariant);
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[test]
fn every_missing_column_is_reported() {
    let table = Table::from_columns(vec![
        Column::new("tenure", numbers(&[1.0])),
        Column::new("MonthlyCharges", numbers(&[1.0])),
        Column::new("TotalCharges", numbers(&[1.0])),
        Column::new("Churn", text(&["No"])),
    ])
    .unwrap();
    match normalizer().normalize(&table) {
        Err(ChurnError::SchemaMismatch { missing, available }) => {
            assert_eq!(missing, vec!["Contract", "PaymentMethod"]);
            assert_eq!(available, vec!["tenure", "MonthlyCharges", "TotalCharges", "Churn"]);
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn missing_target_is_listed_last() {
    let table = Table::from_columns(vec![Column::new("tenure", numbers(&[1.0]))]).unwrap();
    match normalizer().normalize(&table) {
        Err(ChurnError::SchemaMismatch { missing, .. }) => {
            assert_eq!(
                missing,
                vec!["MonthlyCharges", "TotalCharges", "Contract", "PaymentMethod", "Churn"]
            );
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn numeric_hints_coerce_text_and_fill_blanks() {
    let normalized = normalizer().normalize(&telco_export()).unwrap();
    let total = normalized
        .features
        .column("TotalCharges")
        .unwrap()
        .numbers()
        .unwrap();
    assert_eq!(total, vec![70.5, 480.0, 0.0]);
}

#[test]
fn unexpected_target_labels_fall_back_to_codes() {
    let mut columns = telco_export().into_columns();
    let last = columns.len() - 1;
    columns[last].values = text(&["churned", "stayed", "churned"]);
    let table = Table::from_columns(columns).unwrap();

    let target = normalizer().normalize(&table).unwrap().target.unwrap();
    assert_eq!(target.labels, vec![0, 1, 0]);
    assert_eq!(
        target.encoding,
        TargetEncoding::Fallback {
            classes: vec!["churned".to_string(), "stayed".to_string()]
        }
    );
}

#[test]
fn blank_target_cell_keeps_yes_as_churn() {
    let mut columns = telco_export().into_columns();
    let last = columns.len() - 1;
    columns[last] = Column::new("Churn Label", vec![Some(Scalar::from("Yes")), None, Some(Scalar::from("No"))]);
    let table = Table::from_columns(columns).unwrap();

    let normalized = normalizer().normalize(&table).unwrap();
    let target = normalized.target.unwrap();
    assert_eq!(target.encoding, TargetEncoding::Primary);
    assert_eq!(target.labels, vec![1, 0]);
    assert_eq!(
        normalized.features.column("tenure").unwrap().numbers().unwrap(),
        vec![1.0, 60.0]
    );
}

#[test]
fn normalizing_twice_changes_nothing() {
    let first = normalizer().normalize(&telco_export()).unwrap();
    let features = first.features.clone();
    let labels = first.target.as_ref().unwrap().labels.clone();

    let second = normalizer().normalize(&first.into_table().unwrap()).unwrap();
    assert_eq!(second.features, features);
    assert_eq!(second.target.unwrap().labels, labels);
    assert!(second
        .resolutions
        .iter()
        .all(|r| r.rule == NameRule::Verbatim));
}
