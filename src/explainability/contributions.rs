//! Baseline-relative feature contributions
//!
//! Each contribution swaps one field of a reference passenger for the
//! explained passenger's value and measures the change in P(survived). This is
//! a one-at-a-time approximation: interactions are ignored, so contributions
//! need not sum to `actual_probability - baseline_probability`.

use crate::dataset::RawRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference passenger: third-class adult male travelling alone from Southampton
pub fn baseline_record() -> RawRecord {
    RawRecord::new(3, "male", "Mr. Baseline")
        .with_age(28.0)
        .with_fare(14.5)
        .with_family(0, 0)
        .with_embarked("S")
}

/// Fields whose contribution is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionField {
    Pclass,
    Sex,
    Age,
    Fare,
}

impl ContributionField {
    pub const ALL: [ContributionField; 4] = [
        ContributionField::Pclass,
        ContributionField::Sex,
        ContributionField::Age,
        ContributionField::Fare,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContributionField::Pclass => "Pclass",
            ContributionField::Sex => "Sex",
            ContributionField::Age => "Age",
            ContributionField::Fare => "Fare",
        }
    }

    /// Copy this field from `source` into `target`
    pub(crate) fn transplant(&self, source: &RawRecord, target: &mut RawRecord) {
        match self {
            ContributionField::Pclass => target.pclass = source.pclass,
            ContributionField::Sex => target.sex = source.sex.clone(),
            ContributionField::Age => target.age = source.age,
            ContributionField::Fare => target.fare = source.fare,
        }
    }
}

impl fmt::Display for ContributionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Change in P(survived) attributed to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: ContributionField,
    pub contribution: f64,
}

/// Contributions of the measured fields relative to the baseline passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionResult {
    pub baseline_probability: f64,
    pub actual_probability: f64,
    pub contributions: Vec<FeatureContribution>,
}

impl ContributionResult {
    pub fn get(&self, field: ContributionField) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == field)
            .map(|c| c.contribution)
    }

    pub fn sum_contributions(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// Part of the total change the one-at-a-time contributions leave unexplained
    pub fn interaction_residual(&self) -> f64 {
        self.actual_probability - self.baseline_probability - self.sum_contributions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_passenger() {
        let baseline = baseline_record();
        assert_eq!(baseline.pclass, 3);
        assert_eq!(baseline.sex, "male");
        assert_eq!(baseline.age, Some(28.0));
        assert_eq!(baseline.fare, Some(14.5));
        assert_eq!(baseline.embarked.as_deref(), Some("S"));
        assert!(baseline.cabin.is_none());
        assert!(baseline.validate().is_ok());
    }

    #[test]
    fn test_transplant_single_field() {
        let source = RawRecord::new(1, "female", "Smith, Mrs. Anna").with_fare(80.0);
        let mut target = baseline_record();
        ContributionField::Fare.transplant(&source, &mut target);

        assert_eq!(target.fare, Some(80.0));
        assert_eq!(target.pclass, 3);
        assert_eq!(target.sex, "male");
    }

    #[test]
    fn test_residual() {
        let result = ContributionResult {
            baseline_probability: 0.1,
            actual_probability: 0.9,
            contributions: vec![
                FeatureContribution { feature: ContributionField::Pclass, contribution: 0.3 },
                FeatureContribution { feature: ContributionField::Sex, contribution: 0.4 },
            ],
        };
        assert!((result.interaction_residual() - 0.1).abs() < 1e-12);
        assert_eq!(result.get(ContributionField::Sex), Some(0.4));
        assert_eq!(result.get(ContributionField::Age), None);
    }
}
