//! Integration test: Fairness metrics and threshold violations

use ndarray::{array, Array1};
use survival_fairness::fairness::{
    demographic_parity_difference, disparate_impact, equal_opportunity_difference,
    FairnessEvaluator, FairnessThresholds, FairnessViolation,
};

fn pseudo_random(n: usize, seed: u64) -> Array1<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 2) as f64
        })
        .collect()
}

#[test]
fn test_metrics_stay_in_bounds() {
    let evaluator = FairnessEvaluator::default();
    for seed in 0..20 {
        let y_true = pseudo_random(40, seed);
        let y_pred = pseudo_random(40, seed + 100);
        let partition = pseudo_random(40, seed + 200);

        let metrics = evaluator.evaluate(&y_true, &y_pred, &partition).unwrap();
        assert!(metrics.disparate_impact >= 0.0);
        assert!((0.0..=1.0).contains(&metrics.equal_opportunity_diff));
        assert!((0.0..=1.0).contains(&metrics.demographic_parity_diff));
    }
}

#[test]
fn test_zero_privileged_rate() {
    let y_pred = array![0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
    let partition = array![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    assert_eq!(disparate_impact(&y_pred, &partition), 0.0);
    assert!((demographic_parity_difference(&y_pred, &partition) - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_equal_opportunity_ignores_negatives() {
    let y_true = array![1.0, 0.0, 1.0, 0.0];
    let y_pred = array![1.0, 1.0, 1.0, 0.0];
    let partition = array![1.0, 1.0, 0.0, 0.0];
    assert_eq!(equal_opportunity_difference(&y_true, &y_pred, &partition), 0.0);
}

#[test]
fn test_custom_thresholds() {
    let strict = FairnessThresholds {
        disparate_impact_min: 0.95,
        equal_opportunity_max: 0.0,
        demographic_parity_max: 0.0,
    };
    let evaluator = FairnessEvaluator::new(strict);

    let y_true = array![1.0, 1.0, 1.0, 1.0];
    let y_pred = array![1.0, 1.0, 1.0, 0.0];
    let partition = array![1.0, 1.0, 0.0, 0.0];

    let metrics = evaluator.evaluate(&y_true, &y_pred, &partition).unwrap();
    let violations = evaluator.violations("first_class", &metrics);
    assert_eq!(violations.len(), 3);
    assert!(violations.iter().all(|v| match v {
        FairnessViolation::DisparateImpact { attribute, .. }
        | FairnessViolation::EqualOpportunity { attribute, .. }
        | FairnessViolation::DemographicParity { attribute, .. } => attribute == "first_class",
    }));

    let lenient = FairnessEvaluator::default();
    assert_eq!(lenient.violations("first_class", &metrics).len(), 3);
}

#[test]
fn test_thresholds_from_partial_json() {
    let thresholds: FairnessThresholds = serde_json::from_str(r#"{"disparate_impact_min": 0.7}"#).unwrap();
    assert_eq!(thresholds.disparate_impact_min, 0.7);
    assert_eq!(thresholds.equal_opportunity_max, 0.1);
    assert_eq!(thresholds.demographic_parity_max, 0.1);
}
