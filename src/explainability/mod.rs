//! Model explainability module
//!
//! Explanations built from repeated predictor calls:
//! - Counterfactual scenarios (other ticket classes, flipped sex)
//! - Feature contributions relative to a baseline passenger

mod contributions;
mod counterfactual;

pub use contributions::{baseline_record, ContributionField, ContributionResult, FeatureContribution};
pub use counterfactual::{Counterfactual, ExplanationResult};

use crate::dataset::RawRecord;
use crate::error::Result;
use crate::inference::Predictor;
use tracing::debug;

/// Explains predictions of a borrowed predictor
#[derive(Debug, Clone, Copy)]
pub struct Explainer<'a> {
    predictor: &'a Predictor,
}

impl<'a> Explainer<'a> {
    pub fn new(predictor: &'a Predictor) -> Self {
        Self { predictor }
    }

    /// Prediction plus the survival probability under each counterfactual scenario
    pub fn explain(&self, record: &RawRecord) -> Result<ExplanationResult> {
        let prediction = self.predictor.predict(record)?;
        let base = prediction.probability.survived;

        let counterfactuals = counterfactual::scenarios(record)
            .into_iter()
            .map(|(description, altered)| {
                let new_probability = self.predictor.survival_probability(&altered)?;
                Ok(Counterfactual {
                    description,
                    new_probability,
                    delta: new_probability - base,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(n = counterfactuals.len(), "Built counterfactuals");

        Ok(ExplanationResult {
            prediction,
            counterfactuals,
        })
    }

    /// One-at-a-time contributions of Pclass, Sex, Age and Fare against [`baseline_record`]
    pub fn feature_contributions(&self, record: &RawRecord) -> Result<ContributionResult> {
        let baseline = baseline_record();
        let baseline_probability = self.predictor.survival_probability(&baseline)?;
        let actual_probability = self.predictor.survival_probability(record)?;

        let contributions = ContributionField::ALL
            .iter()
            .map(|&field| {
                let mut altered = baseline.clone();
                field.transplant(record, &mut altered);
                let probability = self.predictor.survival_probability(&altered)?;
                Ok(FeatureContribution {
                    feature: field,
                    contribution: probability - baseline_probability,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ContributionResult {
            baseline_probability,
            actual_probability,
            contributions,
        })
    }
}
