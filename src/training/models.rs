//! Model trait and evaluation metrics

use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Held-out classification metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
}

impl ModelMetrics {
    /// Compute classification metrics from labels, predicted labels and P(y = 1) scores
    pub fn compute_classification(y_true: &Array1<f64>, y_pred: &Array1<f64>, y_score: &Array1<f64>) -> Self {
        let n = y_true.len();
        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| (*t - *p).abs() < 0.5)
            .count();
        let accuracy = if n > 0 { correct as f64 / n as f64 } else { 0.0 };

        let (tp, fp, _, fn_) = Self::confusion_counts(y_true, y_pred);
        let precision = if tp + fp > 0 { tp as f64 / (tp + fp) as f64 } else { 0.0 };
        let recall = if tp + fn_ > 0 { tp as f64 / (tp + fn_) as f64 } else { 0.0 };
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            roc_auc: roc_auc(y_true, y_score),
        }
    }

    fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
        let mut tp = 0;
        let mut fp = 0;
        let mut tn = 0;
        let mut fn_ = 0;

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        (tp, fp, tn, fn_)
    }
}

/// Area under the ROC curve via the rank statistic, averaging ranks over ties.
///
/// Undefined when only one class is present; that case logs a warning and returns 0.5.
pub fn roc_auc(y_true: &Array1<f64>, y_score: &Array1<f64>) -> f64 {
    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        warn!(n_pos, n_neg, "ROC AUC undefined for a single-class split, reporting 0.5");
        return 0.5;
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; order.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie block
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();
    let n_pos = n_pos as f64;
    (pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}

/// Binary classifier capability set
pub trait Model: Send + Sync {
    /// Stable identifier used in reports
    fn name(&self) -> &'static str;

    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Class probabilities, one `[P(0), P(1)]` row per sample
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Hard labels thresholded at P(1) >= 0.5
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(1).mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Whether [`Model::feature_importances`] returns a value
    fn supports_importance(&self) -> bool {
        false
    }

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

impl Model for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LogisticRegression::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        LogisticRegression::predict_proba(self, x)
    }
}

impl Model for RandomForest {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        RandomForest::predict_proba(self, x)
    }

    fn supports_importance(&self) -> bool {
        true
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        RandomForest::feature_importances(self).cloned()
    }
}

impl Model for GradientBoostingClassifier {
    fn name(&self) -> &'static str {
        "gradient_boosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GradientBoostingClassifier::fit(self, x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        GradientBoostingClassifier::predict_proba(self, x)
    }

    fn supports_importance(&self) -> bool {
        true
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        GradientBoostingClassifier::feature_importances(self).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_metrics() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let y_score = array![0.9, 0.2, 0.8, 0.4, 0.1, 0.7, 0.6, 0.3];

        let metrics = ModelMetrics::compute_classification(&y_true, &y_pred, &y_score);

        assert_eq!(metrics.accuracy, 0.75);
        assert_eq!(metrics.precision, 0.75);
        assert_eq!(metrics.recall, 0.75);
        assert_eq!(metrics.f1_score, 0.75);
        // Only the (0.4 positive, 0.6 negative) pair is misordered
        assert!((metrics.roc_auc - 15.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let metrics = ModelMetrics::compute_classification(&y_true, &y_pred, &array![0.1, 0.2]);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
    }

    #[test]
    fn test_roc_auc_ties_and_single_class() {
        assert_eq!(roc_auc(&array![1.0, 0.0], &array![0.5, 0.5]), 0.5);
        assert_eq!(roc_auc(&array![1.0, 0.0, 1.0], &array![0.9, 0.1, 0.8]), 1.0);
        assert_eq!(roc_auc(&array![1.0, 1.0], &array![0.3, 0.7]), 0.5);
    }

    #[test]
    fn test_capabilities() {
        assert!(!LogisticRegression::new().supports_importance());
        assert!(Model::feature_importances(&LogisticRegression::new()).is_none());
        assert!(RandomForest::new_classifier(2).supports_importance());
    }

    #[test]
    fn test_default_predict_thresholds_column_one() {
        let x = array![[-3.0], [3.0]];
        let y = array![0.0, 1.0];
        let mut model = LogisticRegression::new();
        Model::fit(&mut model, &x, &y).unwrap();
        assert_eq!(Model::predict(&model, &x).unwrap(), array![0.0, 1.0]);
    }
}
