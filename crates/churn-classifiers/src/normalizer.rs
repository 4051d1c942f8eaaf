//! Reconcile arbitrary dataset columns with a canonical feature schema.
//!
//! Column names are matched by an ordered list of pure rules (`NameRule`),
//! tried one rule at a time across all required names so that exact matches
//! are always claimed before looser ones. Matched columns are then coerced to
//! their expected types and, when a target is required, the label column is
//! encoded to integers.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{AliasRule, SchemaConfig};
use crate::data_handling::{Cell, Column, Scalar, Table};
use crate::error::{ChurnError, Result};
use crate::schema::FeatureSchema;

/// How an observed column name was matched to a canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameRule {
    /// Trimmed name equals the canonical name.
    Verbatim,
    /// Listed in the alias table.
    Alias,
    /// Equal ignoring case.
    CaseInsensitive,
    /// Equal ignoring case and all whitespace.
    Compact,
    /// A yes/no label column standing in for an absent target.
    LabelVariant,
}

/// Rules used for feature columns, in priority order.
pub const FEATURE_RULES: [NameRule; 4] = [
    NameRule::Verbatim,
    NameRule::Alias,
    NameRule::CaseInsensitive,
    NameRule::Compact,
];

/// Rules used for the target column, in priority order.
pub const TARGET_RULES: [NameRule; 5] = [
    NameRule::Verbatim,
    NameRule::Alias,
    NameRule::CaseInsensitive,
    NameRule::Compact,
    NameRule::LabelVariant,
];

/// Explicit renamings from observed to canonical column names.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<AliasRule>,
}

impl AliasTable {
    pub fn new(entries: Vec<AliasRule>) -> Self {
        AliasTable { entries }
    }

    fn primary<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lookup(canonical, false)
    }

    fn label_sources<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lookup(canonical, true)
    }

    fn lookup<'a>(
        &'a self,
        canonical: &'a str,
        label_source: bool,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.to == canonical && e.label_source == label_source)
            .map(|e| e.from.trim())
    }
}

impl NameRule {
    /// Does the (trimmed) observed name match `canonical` under this rule?
    pub fn matches(&self, observed: &str, canonical: &str, aliases: &AliasTable) -> bool {
        match self {
            NameRule::Verbatim => observed == canonical,
            NameRule::Alias => aliases
                .primary(canonical)
                .any(|alias| fold(alias) == fold(observed)),
            NameRule::CaseInsensitive => fold(observed) == fold(canonical),
            NameRule::Compact => compact(observed) == compact(canonical),
            NameRule::LabelVariant => {
                let suffixed = format!("{} Label", canonical);
                compact(observed) == compact(&suffixed)
                    || aliases
                        .label_sources(canonical)
                        .any(|alias| compact(alias) == compact(observed))
            }
        }
    }
}

/// Case folding shared by every case-insensitive rule.
fn fold(name: &str) -> String {
    name.to_lowercase()
}

fn compact(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    fold(&stripped)
}

/// Record of one matched column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnResolution {
    pub canonical: String,
    pub observed: String,
    pub rule: NameRule,
}

/// How the target column was turned into integer labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetEncoding {
    /// Yes/No labels mapped to 1/0, or numeric 0/1 passed through.
    Primary,
    /// Unexpected labels encoded as codes in first-seen order; `classes[i]`
    /// is the observed value that received code `i`.
    Fallback { classes: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTarget {
    pub name: String,
    pub labels: Vec<i32>,
    pub encoding: TargetEncoding,
}

impl EncodedTarget {
    pub fn is_fallback(&self) -> bool {
        matches!(self.encoding, TargetEncoding::Fallback { .. })
    }
}

/// Output of `SchemaNormalizer::normalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Exactly the required feature columns, in required order.
    pub features: Table,
    /// Encoded target, present when the normalizer requires one.
    pub target: Option<EncodedTarget>,
    pub resolutions: Vec<ColumnResolution>,
}

impl NormalizedTable {
    /// Features followed by the encoded target as a numeric column.
    pub fn into_table(self) -> Result<Table> {
        let mut table = self.features;
        if let Some(target) = self.target {
            let values = target
                .labels
                .iter()
                .map(|&label| Some(Scalar::Number(label as f64)))
                .collect();
            table.push_column(Column::new(target.name, values))?;
        }
        Ok(table)
    }
}

/// Maps observed tables onto a fixed list of required columns.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    features: Vec<String>,
    numeric: Vec<String>,
    target: Option<String>,
    aliases: AliasTable,
}

impl SchemaNormalizer {
    pub fn new(features: Vec<String>, numeric: Vec<String>) -> Self {
        SchemaNormalizer {
            features,
            numeric,
            target: None,
            aliases: AliasTable::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Training-time normalizer: required features, numeric hints, target and
    /// aliases all come from the configuration.
    pub fn from_config(config: &SchemaConfig) -> Self {
        SchemaNormalizer::new(config.features.clone(), config.numeric_features.clone())
            .with_target(config.target.clone())
            .with_aliases(AliasTable::new(config.aliases.clone()))
    }

    /// Feature-only normalizer for scoring tables against a trained schema.
    pub fn for_schema(schema: &FeatureSchema, aliases: AliasTable) -> Self {
        SchemaNormalizer::new(
            schema.feature_names().to_vec(),
            schema.numeric_features().to_vec(),
        )
        .with_aliases(aliases)
    }

    pub fn normalize(&self, table: &Table) -> Result<NormalizedTable> {
        let observed: Vec<String> = table
            .column_names()
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        let mut claimed = vec![false; observed.len()];
        let mut feature_matches =
            self.resolve_names(&self.features, &FEATURE_RULES, &observed, &mut claimed);

        let target_match = match &self.target {
            Some(target) => {
                let mut found = self.resolve_names(
                    std::slice::from_ref(target),
                    &TARGET_RULES,
                    &observed,
                    &mut claimed,
                );
                Some(found.remove(0))
            }
            None => None,
        };

        let mut missing: Vec<String> = self
            .features
            .iter()
            .zip(&feature_matches)
            .filter(|(_, m)| m.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        if let (Some(target), Some(None)) = (&self.target, &target_match) {
            missing.push(target.clone());
        }
        if !missing.is_empty() {
            return Err(ChurnError::SchemaMismatch {
                missing,
                available: observed,
            });
        }

        let target_found = match (&self.target, target_match.flatten()) {
            (Some(name), Some(found)) => Some((name, found)),
            _ => None,
        };

        // Rows without a target value cannot be labelled.
        let keep: Option<Vec<bool>> = target_found.map(|(_, (idx, _))| {
            table.columns()[idx]
                .values
                .iter()
                .map(|cell| !is_missing_label(cell))
                .collect()
        });
        let keep = keep.filter(|keep| keep.iter().any(|k| !k));
        if let (Some(keep), Some((name, _))) = (&keep, target_found) {
            log::warn!(
                "Dropped {} row(s) with a missing '{}' value",
                keep.iter().filter(|k| !**k).count(),
                name
            );
        }
        let rows = |column: &Column| match &keep {
            Some(keep) => retain_rows(column, keep),
            None => column.clone(),
        };

        let mut resolutions = Vec::with_capacity(self.features.len() + 1);
        let mut columns = Vec::with_capacity(self.features.len());
        for (name, found) in self.features.iter().zip(feature_matches.iter_mut()) {
            let Some((idx, rule)) = found.take() else {
                continue;
            };
            resolutions.push(self.record(name, &observed[idx], rule));
            let source = rows(&table.columns()[idx]);
            columns.push(self.coerce_feature(name, &source));
        }
        let features = Table::from_columns(columns)?;

        let target = target_found.map(|(name, (idx, rule))| {
            resolutions.push(self.record(name, &observed[idx], rule));
            encode_target(name, &rows(&table.columns()[idx]))
        });

        Ok(NormalizedTable {
            features,
            target,
            resolutions,
        })
    }

    fn resolve_names(
        &self,
        names: &[String],
        rules: &[NameRule],
        observed: &[String],
        claimed: &mut [bool],
    ) -> Vec<Option<(usize, NameRule)>> {
        let mut found: Vec<Option<(usize, NameRule)>> = vec![None; names.len()];
        for rule in rules {
            for (slot, canonical) in found.iter_mut().zip(names) {
                if slot.is_some() {
                    continue;
                }
                let hit = observed.iter().enumerate().position(|(idx, name)| {
                    !claimed[idx] && rule.matches(name, canonical, &self.aliases)
                });
                if let Some(idx) = hit {
                    claimed[idx] = true;
                    *slot = Some((idx, *rule));
                }
            }
        }
        found
    }

    fn record(&self, canonical: &str, observed: &str, rule: NameRule) -> ColumnResolution {
        if rule != NameRule::Verbatim {
            log::debug!("Resolved column '{}' -> '{}' ({:?})", observed, canonical, rule);
        }
        ColumnResolution {
            canonical: canonical.to_string(),
            observed: observed.to_string(),
            rule,
        }
    }

    fn coerce_feature(&self, name: &str, source: &Column) -> Column {
        if self.numeric.iter().any(|n| n == name) {
            let (values, filled) = coerce_numeric(&source.values);
            if filled > 0 {
                log::warn!(
                    "Column '{}': {} value(s) missing or not numeric, filled with 0",
                    name,
                    filled
                );
            }
            return Column::new(name, values);
        }
        Column::new(name, infer_values(&source.values))
    }
}

/// Parse a textual number, tolerating surrounding whitespace, a leading
/// currency symbol and thousands separators.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let unsigned = trimmed.trim_start_matches(&['$', '€', '£'][..]);
    let cleaned: String = unsigned.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell_as_number(cell: &Cell) -> Option<f64> {
    match cell {
        Some(Scalar::Number(v)) if v.is_finite() => Some(*v),
        Some(Scalar::Text(s)) => parse_numeric_text(s),
        _ => None,
    }
}

/// Coerce every cell to a number, filling failures with `0.0`. Returns the
/// coerced cells and how many were filled.
fn coerce_numeric(values: &[Cell]) -> (Vec<Cell>, usize) {
    let mut filled = 0;
    let coerced = values
        .iter()
        .map(|cell| {
            let v = cell_as_number(cell).unwrap_or_else(|| {
                filled += 1;
                0.0
            });
            Some(Scalar::Number(v))
        })
        .collect();
    (coerced, filled)
}

/// Columns without a numeric hint become numbers only if every present value
/// parses; otherwise every present value is kept as text.
fn infer_values(values: &[Cell]) -> Vec<Cell> {
    let all_numeric = values
        .iter()
        .filter(|cell| cell.is_some())
        .all(|cell| cell_as_number(cell).is_some());
    if all_numeric {
        coerce_numeric(values).0
    } else {
        values
            .iter()
            .map(|cell| cell.as_ref().map(|v| Scalar::Text(v.to_string())))
            .collect()
    }
}

fn is_missing_label(cell: &Cell) -> bool {
    match cell {
        None => true,
        Some(Scalar::Text(s)) => s.trim().is_empty(),
        Some(Scalar::Number(v)) => v.is_nan(),
    }
}

fn retain_rows(column: &Column, keep: &[bool]) -> Column {
    let values = column
        .values
        .iter()
        .zip(keep)
        .filter(|(_, keep)| **keep)
        .map(|(cell, _)| cell.clone())
        .collect();
    Column::new(column.name.clone(), values)
}

fn primary_label(cell: &Cell) -> Option<i32> {
    match cell {
        Some(Scalar::Text(s)) => match s.trim() {
            "Yes" => Some(1),
            "No" => Some(0),
            _ => None,
        },
        Some(Scalar::Number(v)) if *v == 0.0 => Some(0),
        Some(Scalar::Number(v)) if *v == 1.0 => Some(1),
        _ => None,
    }
}

/// Encode the target column as integer labels.
///
/// Yes/No and 0/1 values use the fixed mapping. Anything else switches the
/// whole column to first-seen categorical codes and logs a warning.
/// `SchemaNormalizer::normalize` drops rows with a missing target before
/// calling this, so a blank cell never forces a Yes/No column into codes.
pub fn encode_target(name: &str, column: &Column) -> EncodedTarget {
    let primary: Option<Vec<i32>> = column.values.iter().map(primary_label).collect();
    if let Some(labels) = primary {
        return EncodedTarget {
            name: name.to_string(),
            labels,
            encoding: TargetEncoding::Primary,
        };
    }

    let mut codes: HashMap<String, i32> = HashMap::new();
    let mut classes: Vec<String> = Vec::new();
    let labels = column
        .values
        .iter()
        .map(|cell| {
            let key = cell.as_ref().map(|v| v.to_string().trim().to_string()).unwrap_or_default();
            *codes.entry(key.clone()).or_insert_with(|| {
                classes.push(key);
                (classes.len() - 1) as i32
            })
        })
        .collect();

    log::warn!(
        "Target '{}' (from column '{}') has labels outside Yes/No and 0/1; \
         falling back to categorical codes for {:?}",
        name,
        column.name,
        classes
    );

    EncodedTarget {
        name: name.to_string(),
        labels,
        encoding: TargetEncoding::Fallback { classes },
    }
}
