//! Feature preprocessing composed ahead of the estimator.
//!
//! Numeric features are median-imputed and standardized; categorical
//! features are imputed with a constant `"missing"` label and one-hot
//! encoded, with unseen categories mapped to an all-zero block. The output
//! is a dense `f32` design matrix.
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data_handling::{Cell, Column, Scalar, Table};
use crate::error::{ChurnError, Result};
use crate::normalizer::parse_numeric_text;
use crate::schema::FeatureSchema;

/// Label substituted for missing categorical values.
pub const MISSING_CATEGORY: &str = "missing";

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f32 = 1e-6;
}

/// Fit a `Scaler` from an `Array2<f32>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f32>) -> Result<Scaler> {
    if x.nrows() == 0 {
        return Err(ChurnError::Training(
            "cannot fit a scaler on zero rows".to_string(),
        ));
    }
    let mean = x
        .mean_axis(Axis(0))
        .map(|m| m.to_vec())
        .unwrap_or_default();
    let std = x
        .std_axis(Axis(0), 0.0)
        .iter()
        .map(|s| s.max(Scaler::MIN_STD))
        .collect();
    Ok(Scaler { mean, std })
}

/// Standardize all rows of `x` in place.
pub fn transform_all(x: &mut Array2<f32>, sc: &Scaler) {
    for mut row in x.rows_mut() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = (*v - sc.mean[c]) / sc.std[c];
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub median: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    /// Known categories in sorted order; one output column each.
    pub categories: Vec<String>,
}

/// Fitted preprocessing state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericFeature>,
    categorical: Vec<CategoricalFeature>,
    scaler: Scaler,
}

impl Preprocessor {
    /// Learn medians, scaling and category vocabularies from `table`,
    /// using the numeric/categorical partition of `schema`.
    pub fn fit(table: &Table, schema: &FeatureSchema) -> Result<Preprocessor> {
        if table.nrows() == 0 {
            return Err(ChurnError::Training(
                "training table has no rows".to_string(),
            ));
        }

        let mut numeric = Vec::with_capacity(schema.numeric_features().len());
        for name in schema.numeric_features() {
            let values = numeric_values(lookup(table, name)?)?;
            numeric.push(NumericFeature {
                name: name.clone(),
                median: median(&values),
            });
        }

        let mut categorical = Vec::with_capacity(schema.categorical_features().len());
        for name in schema.categorical_features() {
            let column = lookup(table, name)?;
            let mut categories: Vec<String> = column.values.iter().map(category_label).collect();
            categories.sort();
            categories.dedup();
            categorical.push(CategoricalFeature {
                name: name.clone(),
                categories,
            });
        }

        let mut preprocessor = Preprocessor {
            numeric,
            categorical,
            scaler: Scaler {
                mean: Vec::new(),
                std: Vec::new(),
            },
        };
        let raw = preprocessor.numeric_block(table)?;
        preprocessor.scaler = fit_scaler(&raw)?;

        log::debug!(
            "Preprocessor fitted: {} numeric, {} categorical -> {} output columns",
            preprocessor.numeric.len(),
            preprocessor.categorical.len(),
            preprocessor.n_outputs()
        );
        Ok(preprocessor)
    }

    /// Number of columns produced by `transform`.
    pub fn n_outputs(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Input columns in the order they were fitted: numeric, then categorical.
    pub fn input_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|f| f.name.clone())
            .chain(self.categorical.iter().map(|f| f.name.clone()))
            .collect()
    }

    /// Names of the output columns (`feature` or `feature=category`).
    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|f| f.name.clone()).collect();
        for feature in &self.categorical {
            for category in &feature.categories {
                names.push(format!("{}={}", feature.name, category));
            }
        }
        names
    }

    /// Transform a table holding (at least) the fitted feature columns.
    ///
    /// Every absent input column is reported in one `SchemaMismatch`. Text in
    /// a numeric column that does not read as a number is an error.
    pub fn transform(&self, table: &Table) -> Result<Array2<f32>> {
        let table = &table.select(&self.input_names())?;
        let mut numeric = self.numeric_block(table)?;
        transform_all(&mut numeric, &self.scaler);

        let mut out = Array2::<f32>::zeros((table.nrows(), self.n_outputs()));
        let n_numeric = self.numeric.len();
        out.slice_mut(ndarray::s![.., ..n_numeric]).assign(&numeric);

        let mut offset = n_numeric;
        for feature in &self.categorical {
            let column = lookup(table, &feature.name)?;
            for (row, cell) in column.values.iter().enumerate() {
                let label = category_label(cell);
                if let Ok(pos) = feature.categories.binary_search(&label) {
                    out[(row, offset + pos)] = 1.0;
                }
            }
            offset += feature.categories.len();
        }
        Ok(out)
    }

    /// Imputed, unscaled numeric columns.
    fn numeric_block(&self, table: &Table) -> Result<Array2<f32>> {
        let mut block = Array2::<f32>::zeros((table.nrows(), self.numeric.len()));
        for (c, feature) in self.numeric.iter().enumerate() {
            let values = numeric_values(lookup(table, &feature.name)?)?;
            for (r, value) in values.into_iter().enumerate() {
                block[(r, c)] = value.unwrap_or(feature.median);
            }
        }
        Ok(block)
    }
}

fn lookup<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| ChurnError::InvalidTable(format!("column '{}' not found", name)))
}

fn numeric_values(column: &Column) -> Result<Vec<Option<f32>>> {
    column
        .values
        .iter()
        .map(|cell| match cell {
            None => Ok(None),
            Some(Scalar::Number(v)) if v.is_finite() => Ok(Some(*v as f32)),
            Some(Scalar::Number(_)) => Ok(None),
            Some(Scalar::Text(s)) => parse_numeric_text(s)
                .map(|v| Some(v as f32))
                .ok_or_else(|| {
                    ChurnError::InvalidTable(format!(
                        "could not convert '{}' to a number for feature '{}'",
                        s, column.name
                    ))
                }),
        })
        .collect()
}

fn category_label(cell: &Cell) -> String {
    match cell {
        Some(value) => value.to_string(),
        None => MISSING_CATEGORY.to_string(),
    }
}

fn median(values: &[Option<f32>]) -> f32 {
    let mut present: Vec<f32> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new(
                "tenure",
                vec![
                    Some(Scalar::Number(1.0)),
                    Some(Scalar::Number(2.0)),
                    None,
                    Some(Scalar::Number(4.0)),
                ],
            ),
            Column::new(
                "Contract",
                vec![
                    Some("Two year".into()),
                    Some("Month-to-month".into()),
                    None,
                    Some("Two year".into()),
                ],
            ),
        ])
        .unwrap()
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec!["tenure".to_string(), "Contract".to_string()],
            vec!["tenure".to_string()],
            vec!["Contract".to_string()],
            "Churn",
        )
        .unwrap()
    }

    #[test]
    fn fit_scaler_computes_mean_and_std() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
            .unwrap();
        let sc = fit_scaler(&x).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-5);
        assert!((sc.mean[1] - 25.0).abs() < 1e-5);
        assert!(sc.std.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn constant_column_does_not_divide_by_zero() {
        let mut x = Array2::from_shape_vec((3, 1), vec![5.0, 5.0, 5.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        transform_all(&mut x, &sc);
        assert!(x.iter().all(|v| v.is_finite() && v.abs() < 1e-3));
    }

    #[test]
    fn median_imputation_and_one_hot_layout() {
        let pre = Preprocessor::fit(&table(), &schema()).unwrap();
        assert_eq!(
            pre.output_names(),
            vec![
                "tenure",
                "Contract=Month-to-month",
                "Contract=Two year",
                "Contract=missing"
            ]
        );
        let x = pre.transform(&table()).unwrap();
        assert_eq!(x.shape(), &[4, 4]);
        // the imputed median (2.0) equals the second row after scaling
        assert!((x[(2, 0)] - x[(1, 0)]).abs() < 1e-6);
        assert_eq!(x[(0, 2)], 1.0);
        assert_eq!(x[(2, 3)], 1.0);
    }

    #[test]
    fn unseen_category_is_all_zero() {
        let pre = Preprocessor::fit(&table(), &schema()).unwrap();
        let row = Table::from_columns(vec![
            Column::new("tenure", vec![Some(Scalar::Number(3.0))]),
            Column::new("Contract", vec![Some("Ten year".into())]),
        ])
        .unwrap();
        let x = pre.transform(&row).unwrap();
        assert!(x.row(0).iter().skip(1).all(|v| *v == 0.0));
    }

    #[test]
    fn non_numeric_text_in_numeric_column_is_rejected() {
        let pre = Preprocessor::fit(&table(), &schema()).unwrap();
        let row = Table::from_columns(vec![
            Column::new("tenure", vec![Some("twelve".into())]),
            Column::new("Contract", vec![Some("Two year".into())]),
        ])
        .unwrap();
        assert!(pre.transform(&row).is_err());
    }

    #[test]
    fn transform_names_every_absent_input() {
        let pre = Preprocessor::fit(&table(), &schema()).unwrap();
        let other = Table::from_columns(vec![Column::new("Churn", vec![Some(Scalar::Number(1.0))])])
            .unwrap();
        match pre.transform(&other) {
            Err(ChurnError::SchemaMismatch { missing, .. }) => {
                assert_eq!(missing, vec!["tenure", "Contract"]);
            }
            other => panic!("expected schema mismatch, got {:?}", other.map(|x| x.shape().to_vec())),
        }
    }

    #[test]
    fn empty_table_cannot_be_fitted() {
        let empty = Table::with_headers(&["tenure", "Contract"]);
        assert!(Preprocessor::fit(&empty, &schema()).is_err());
    }
}
