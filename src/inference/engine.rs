//! Inference engine implementation

use super::InferenceConfig;
use crate::dataset::{PassengerInput, RawRecord};
use crate::error::{Result, SurvivalError};
use crate::preprocessing::Preprocessor;
use crate::training::{Model, TrainedModel};
use ndarray::Axis;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Class probabilities of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalProbability {
    pub died: f64,
    pub survived: f64,
}

/// Importance of one model input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Answer to a single prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 when P(survived) >= 0.5
    pub survived: u8,
    pub probability: SurvivalProbability,
    /// Probability of the predicted class
    pub confidence: f64,
    /// Most important features, descending; empty when the model has none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_importance: Vec<FeatureImportance>,
}

/// Trained model plus fitted preprocessor answering prediction requests.
///
/// Both artifacts are shared read-only, so a `Predictor` can be cloned cheaply
/// and used from several threads.
#[derive(Debug, Clone)]
pub struct Predictor {
    config: InferenceConfig,
    model: Arc<TrainedModel>,
    preprocessor: Arc<Preprocessor>,
    importances: Arc<Vec<FeatureImportance>>,
}

impl Predictor {
    pub fn new(model: TrainedModel, preprocessor: Preprocessor) -> Self {
        Self::from_shared(Arc::new(model), Arc::new(preprocessor), InferenceConfig::default())
    }

    /// Build from already shared artifacts
    pub fn from_shared(model: Arc<TrainedModel>, preprocessor: Arc<Preprocessor>, config: InferenceConfig) -> Self {
        let importances = Arc::new(top_importances(&model, &preprocessor, config.top_k_importances));
        Self {
            config,
            model,
            preprocessor,
            importances,
        }
    }

    /// Builder method to replace the inference configuration
    pub fn with_config(self, config: InferenceConfig) -> Self {
        Self::from_shared(self.model, self.preprocessor, config)
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// P(survived) for one record
    pub fn survival_probability(&self, record: &RawRecord) -> Result<f64> {
        record.validate()?;
        let features = self.preprocessor.transform_record(record)?;
        let proba = self.model.predict_proba(&features.insert_axis(Axis(0)))?;
        if proba.dim() != (1, 2) {
            return Err(SurvivalError::ShapeError {
                expected: "(1, 2)".to_string(),
                actual: format!("{:?}", proba.dim()),
            });
        }
        Ok(proba[[0, 1]])
    }

    /// Predict survival for one record
    pub fn predict(&self, record: &RawRecord) -> Result<PredictionResult> {
        let survived = self.survival_probability(record)?;
        let died = 1.0 - survived;
        let label = u8::from(survived >= 0.5);

        debug!(model = self.model.name(), p_survived = survived, "Predicted record");

        Ok(PredictionResult {
            survived: label,
            probability: SurvivalProbability { died, survived },
            confidence: died.max(survived),
            feature_importance: self.importances.to_vec(),
        })
    }

    /// Predict every record, keeping input order and per-record errors
    pub fn batch_predict(&self, records: &[RawRecord]) -> Vec<Result<PredictionResult>> {
        let results: Vec<Result<PredictionResult>> = if self.config.parallel_batch {
            records.par_iter().map(|r| self.predict(r)).collect()
        } else {
            records.iter().map(|r| self.predict(r)).collect()
        };
        log_failures(&results);
        results
    }

    /// Validate and predict wire-level inputs, keeping input order and per-record errors
    pub fn batch_predict_inputs(&self, inputs: &[PassengerInput]) -> Vec<Result<PredictionResult>> {
        let predict_input = |input: &PassengerInput| -> Result<PredictionResult> {
            let record = RawRecord::try_from(input.clone())?;
            self.predict(&record)
        };
        let results: Vec<Result<PredictionResult>> = if self.config.parallel_batch {
            inputs.par_iter().map(predict_input).collect()
        } else {
            inputs.iter().map(predict_input).collect()
        };
        log_failures(&results);
        results
    }
}

fn log_failures(results: &[Result<PredictionResult>]) {
    let (rejected, failed) = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .fold((0usize, 0usize), |(rejected, failed), e| {
            if e.is_record_error() {
                (rejected + 1, failed)
            } else {
                (rejected, failed + 1)
            }
        });
    if rejected > 0 {
        warn!(rejected, total = results.len(), "Some records were rejected");
    }
    if failed > 0 {
        error!(failed, total = results.len(), "Prediction failed for some records");
    }
}

/// Top-k model importances by descending value; equal values keep column order
fn top_importances(model: &TrainedModel, preprocessor: &Preprocessor, k: usize) -> Vec<FeatureImportance> {
    if !model.supports_importance() {
        return Vec::new();
    }
    let Some(values) = model.feature_importances() else {
        return Vec::new();
    };

    let mut importances: Vec<FeatureImportance> = preprocessor
        .feature_names()
        .iter()
        .zip(values.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();
    importances.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(Ordering::Equal));
    importances.truncate(k);
    importances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate, SyntheticConfig};
    use crate::training::{ModelType, Trainer, TrainingConfig};

    fn trained(model_type: ModelType) -> Predictor {
        let dataset = generate(&SyntheticConfig::default().with_n_samples(200)).unwrap();
        let config = TrainingConfig::default()
            .with_n_estimators(10)
            .with_candidates(vec![model_type]);
        let outcome = Trainer::new(config).train(&dataset).unwrap();
        Predictor::new(outcome.model, outcome.preprocessor)
    }

    fn passenger() -> RawRecord {
        RawRecord::new(1, "female", "Cumings, Mrs. John Bradley")
            .with_age(38.0)
            .with_fare(71.2833)
            .with_family(1, 0)
            .with_embarked("C")
            .with_cabin("C85")
    }

    #[test]
    fn test_predict_shape() {
        let predictor = trained(ModelType::RandomForest);
        let result = predictor.predict(&passenger()).unwrap();

        assert!((result.probability.died + result.probability.survived - 1.0).abs() < 1e-12);
        assert_eq!(result.confidence, result.probability.died.max(result.probability.survived));
        assert_eq!(result.survived, u8::from(result.probability.survived >= 0.5));
        assert_eq!(result.feature_importance.len(), 10);
        assert!(result
            .feature_importance
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_no_importances_for_linear_model() {
        let predictor = trained(ModelType::LogisticRegression);
        let result = predictor.predict(&passenger()).unwrap();
        assert!(result.feature_importance.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("feature_importance").is_none());
    }

    #[test]
    fn test_unseen_embarked() {
        let predictor = trained(ModelType::LogisticRegression);
        let record = passenger().with_embarked("X");
        let err = predictor.predict(&record).unwrap_err();
        assert!(matches!(err, SurvivalError::UnseenCategory { ref column, .. } if column == "Embarked"));
    }

    #[test]
    fn test_batch_preserves_order() {
        let predictor = trained(ModelType::GradientBoosting).with_config(InferenceConfig::new().with_top_k_importances(3));
        let male = RawRecord::new(3, "male", "Braund, Mr. Owen Harris")
            .with_age(22.0)
            .with_fare(7.25)
            .with_family(1, 0)
            .with_embarked("S");
        let records = vec![passenger(), passenger().with_embarked("X"), male.clone()];

        let results = predictor.batch_predict(&records);
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
        assert_eq!(results[0].as_ref().unwrap(), &predictor.predict(&records[0]).unwrap());
        assert_eq!(results[2].as_ref().unwrap(), &predictor.predict(&male).unwrap());
        assert_eq!(results[0].as_ref().unwrap().feature_importance.len(), 3);
    }

    #[test]
    fn test_batch_inputs_huge_family_is_per_record_error() {
        let predictor = trained(ModelType::LogisticRegression);
        let mut huge = PassengerInput::from(&passenger());
        huge.sib_sp = Some(u32::MAX);
        let inputs = vec![PassengerInput::from(&passenger()), huge];

        let results = predictor.batch_predict_inputs(&inputs);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SurvivalError::InvalidField { field: "SibSp", .. })));
    }

    #[test]
    fn test_batch_inputs_missing_field() {
        let predictor = trained(ModelType::LogisticRegression).with_config(InferenceConfig::new().with_parallel_batch(false));
        let mut missing = PassengerInput::from(&passenger());
        missing.name = None;
        let inputs = vec![PassengerInput::from(&passenger()), missing];

        let results = predictor.batch_predict_inputs(&inputs);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SurvivalError::MissingRequiredField("Name"))));
    }
}
