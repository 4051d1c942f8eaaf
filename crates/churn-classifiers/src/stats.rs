//! Summary metrics reported after training.
use serde::{Deserialize, Serialize};

/// Metrics of a fitted pipeline on its own training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub n_rows: usize,
    /// Share of rows labelled as churn.
    pub positive_rate: f64,
    /// Agreement between the estimator's labels and the training labels.
    pub accuracy: f64,
    /// `None` when only one class is present.
    pub roc_auc: Option<f64>,
}

impl TrainingMetrics {
    pub fn compute(labels: &[i32], predicted: &[i32], proba: &[f64]) -> Self {
        let n_rows = labels.len();
        let positives = labels.iter().filter(|&&l| l == 1).count();
        TrainingMetrics {
            n_rows,
            positive_rate: ratio(positives, n_rows),
            accuracy: accuracy(labels, predicted),
            roc_auc: roc_auc(labels, proba),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Fraction of positions where `predicted` equals `labels`.
pub fn accuracy(labels: &[i32], predicted: &[i32]) -> f64 {
    assert_eq!(labels.len(), predicted.len(), "labels and predictions must have equal lengths");
    let correct = labels
        .iter()
        .zip(predicted)
        .filter(|(l, p)| l == p)
        .count();
    ratio(correct, labels.len())
}

/// Area under the ROC curve for the churn class (label 1), computed from
/// average ranks so tied scores count half.
pub fn roc_auc(labels: &[i32], scores: &[f64]) -> Option<f64> {
    assert_eq!(labels.len(), scores.len(), "labels and scores must have equal lengths");
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0f64; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; ties share the mean rank
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l == 1)
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}
