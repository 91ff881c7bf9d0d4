//! Fairness Metrics and Bias Detection Module
//!
//! Group-fairness metrics over a binary sensitive partition, where 1.0 marks
//! the privileged group and 0.0 the unprivileged one. Rates over an empty
//! group, and ratios with a zero denominator, evaluate to 0 instead of NaN.

use crate::error::{Result, SurvivalError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Thresholds for determining fairness violations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessThresholds {
    /// Minimum acceptable disparate impact ratio (the "80% rule")
    pub disparate_impact_min: f64,
    /// Maximum acceptable equal opportunity difference
    pub equal_opportunity_max: f64,
    /// Maximum acceptable demographic parity difference
    pub demographic_parity_max: f64,
}

impl Default for FairnessThresholds {
    fn default() -> Self {
        Self {
            disparate_impact_min: 0.8,
            equal_opportunity_max: 0.1,
            demographic_parity_max: 0.1,
        }
    }
}

/// Fairness metrics for one sensitive attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairnessMetrics {
    pub disparate_impact: f64,
    pub equal_opportunity_diff: f64,
    pub demographic_parity_diff: f64,
}

/// A detected fairness violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FairnessViolation {
    /// Disparate impact ratio below threshold
    DisparateImpact {
        attribute: String,
        ratio: f64,
        threshold: f64,
    },
    /// Equal opportunity difference above threshold
    EqualOpportunity {
        attribute: String,
        difference: f64,
        threshold: f64,
    },
    /// Demographic parity difference above threshold
    DemographicParity {
        attribute: String,
        difference: f64,
        threshold: f64,
    },
}

impl fmt::Display for FairnessViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FairnessViolation::DisparateImpact { attribute, ratio, threshold } => write!(
                f,
                "{}: disparate impact {:.3} below {:.2}",
                attribute, ratio, threshold
            ),
            FairnessViolation::EqualOpportunity { attribute, difference, threshold } => write!(
                f,
                "{}: equal opportunity difference {:.3} above {:.2}",
                attribute, difference, threshold
            ),
            FairnessViolation::DemographicParity { attribute, difference, threshold } => write!(
                f,
                "{}: demographic parity difference {:.3} above {:.2}",
                attribute, difference, threshold
            ),
        }
    }
}

/// Mean of `values` over rows where `mask` holds, 0 for an empty selection
/// Mean of the selected values; 0 for an empty selection
fn group_mean(values: impl Iterator<Item = (f64, bool)>) -> f64 {
    let (sum, count) = values
        .filter(|(_, selected)| *selected)
        .fold((0.0, 0usize), |(s, c), (v, _)| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Positive-prediction rate of one group (1 privileged, 0 unprivileged)
fn positive_rate(y_pred: &Array1<f64>, partition: &Array1<f64>, group: f64) -> f64 {
    group_mean(y_pred.iter().zip(partition.iter()).map(|(&p, &g)| (p, g == group)))
}

/// True-positive rate of one group
fn true_positive_rate(y_true: &Array1<f64>, y_pred: &Array1<f64>, partition: &Array1<f64>, group: f64) -> f64 {
    group_mean(
        y_true
            .iter()
            .zip(y_pred.iter())
            .zip(partition.iter())
            .map(|((&t, &p), &g)| (p, g == group && t == 1.0)),
    )
}

/// Ratio of the unprivileged to the privileged positive-prediction rate.
///
/// Returns 0 when the privileged group is empty or never predicted positive.
pub fn disparate_impact(y_pred: &Array1<f64>, partition: &Array1<f64>) -> f64 {
    let priv_rate = positive_rate(y_pred, partition, 1.0);
    let unpriv_rate = positive_rate(y_pred, partition, 0.0);
    if priv_rate == 0.0 {
        0.0
    } else {
        unpriv_rate / priv_rate
    }
}

/// Absolute gap in true-positive rate between the two groups.
///
/// A group with no actual positives has a true-positive rate of 0.
pub fn equal_opportunity_difference(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    partition: &Array1<f64>,
) -> f64 {
    let tpr_priv = true_positive_rate(y_true, y_pred, partition, 1.0);
    let tpr_unpriv = true_positive_rate(y_true, y_pred, partition, 0.0);
    (tpr_priv - tpr_unpriv).abs()
}

/// Absolute gap in positive-prediction rate between the two groups
pub fn demographic_parity_difference(y_pred: &Array1<f64>, partition: &Array1<f64>) -> f64 {
    let priv_rate = positive_rate(y_pred, partition, 1.0);
    let unpriv_rate = positive_rate(y_pred, partition, 0.0);
    (priv_rate - unpriv_rate).abs()
}

/// Main fairness evaluator
#[derive(Debug, Clone, Default)]
pub struct FairnessEvaluator {
    thresholds: FairnessThresholds,
}

impl FairnessEvaluator {
    pub fn new(thresholds: FairnessThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FairnessThresholds {
        &self.thresholds
    }

    /// Evaluate predictions against one binary sensitive partition.
    ///
    /// # Arguments
    /// * `y_true` - Ground truth labels (0.0 or 1.0)
    /// * `y_pred` - Predicted labels (0.0 or 1.0)
    /// * `partition` - 1.0 for the privileged group, 0.0 for the unprivileged group
    pub fn evaluate(
        &self,
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        partition: &Array1<f64>,
    ) -> Result<FairnessMetrics> {
        if y_true.len() != y_pred.len() || y_pred.len() != partition.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("{} labels and partition values", y_pred.len()),
                actual: format!("{} labels, {} partition values", y_true.len(), partition.len()),
            });
        }

        Ok(FairnessMetrics {
            disparate_impact: disparate_impact(y_pred, partition),
            equal_opportunity_diff: equal_opportunity_difference(y_true, y_pred, partition),
            demographic_parity_diff: demographic_parity_difference(y_pred, partition),
        })
    }

    /// Threshold breaches for an evaluated attribute
    pub fn violations(&self, attribute: &str, metrics: &FairnessMetrics) -> Vec<FairnessViolation> {
        let mut violations = Vec::new();

        if metrics.disparate_impact < self.thresholds.disparate_impact_min {
            violations.push(FairnessViolation::DisparateImpact {
                attribute: attribute.to_string(),
                ratio: metrics.disparate_impact,
                threshold: self.thresholds.disparate_impact_min,
            });
        }
        if metrics.equal_opportunity_diff > self.thresholds.equal_opportunity_max {
            violations.push(FairnessViolation::EqualOpportunity {
                attribute: attribute.to_string(),
                difference: metrics.equal_opportunity_diff,
                threshold: self.thresholds.equal_opportunity_max,
            });
        }
        if metrics.demographic_parity_diff > self.thresholds.demographic_parity_max {
            violations.push(FairnessViolation::DemographicParity {
                attribute: attribute.to_string(),
                difference: metrics.demographic_parity_diff,
                threshold: self.thresholds.demographic_parity_max,
            });
        }

        for violation in &violations {
            warn!(%violation, "Fairness threshold violated");
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fair_predictions() {
        let y_true = array![1.0, 0.0, 1.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0];
        let partition = array![1.0, 1.0, 0.0, 0.0];

        let evaluator = FairnessEvaluator::default();
        let metrics = evaluator.evaluate(&y_true, &y_pred, &partition).unwrap();
        assert_eq!(metrics.disparate_impact, 1.0);
        assert_eq!(metrics.equal_opportunity_diff, 0.0);
        assert_eq!(metrics.demographic_parity_diff, 0.0);
        assert!(evaluator.violations("sex", &metrics).is_empty());
    }

    #[test]
    fn test_biased_predictions() {
        // Privileged group always predicted positive, unprivileged mostly negative
        let y_true = array![1.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let y_pred = array![1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        let partition = array![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

        let evaluator = FairnessEvaluator::default();
        let metrics = evaluator.evaluate(&y_true, &y_pred, &partition).unwrap();
        assert!((metrics.disparate_impact - 1.0 / 3.0).abs() < 1e-12);
        assert!((metrics.equal_opportunity_diff - 0.5).abs() < 1e-12);
        assert!((metrics.demographic_parity_diff - 2.0 / 3.0).abs() < 1e-12);

        let violations = evaluator.violations("sex", &metrics);
        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[0], FairnessViolation::DisparateImpact { .. }));
    }

    #[test]
    fn test_zero_privileged_rate_guard() {
        let y_pred = array![0.0, 0.0, 1.0, 1.0];
        let partition = array![1.0, 1.0, 0.0, 0.0];
        assert_eq!(disparate_impact(&y_pred, &partition), 0.0);

        // Empty privileged group
        let partition = array![0.0, 0.0, 0.0, 0.0];
        assert_eq!(disparate_impact(&y_pred, &partition), 0.0);
        assert_eq!(demographic_parity_difference(&y_pred, &partition), 0.5);
    }

    #[test]
    fn test_no_actual_positives() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_pred = array![1.0, 1.0, 1.0, 0.0];
        let partition = array![1.0, 1.0, 0.0, 0.0];
        // Privileged TPR is 0 by convention, unprivileged TPR is 0.5
        assert_eq!(equal_opportunity_difference(&y_true, &y_pred, &partition), 0.5);
    }

    #[test]
    fn test_mismatched_lengths() {
        let evaluator = FairnessEvaluator::default();
        let result = evaluator.evaluate(&array![1.0, 0.0], &array![1.0, 0.0], &array![1.0]);
        assert!(matches!(result, Err(SurvivalError::ShapeError { .. })));
    }

    #[test]
    fn test_metrics_ignore_unpaired_rows() {
        let y_pred = array![1.0, 0.0, 1.0];
        let partition = array![1.0, 0.0];
        assert_eq!(disparate_impact(&y_pred, &partition), 0.0);
        assert_eq!(demographic_parity_difference(&y_pred, &partition), 1.0);
        assert_eq!(equal_opportunity_difference(&array![1.0], &y_pred, &partition), 1.0);
    }

    #[test]
    fn test_violation_serialization() {
        let violation = FairnessViolation::DemographicParity {
            attribute: "pclass".to_string(),
            difference: 0.25,
            threshold: 0.1,
        };
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["kind"], "demographic_parity");
        assert_eq!(json["attribute"], "pclass");
    }
}
