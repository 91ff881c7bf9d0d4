//! Training engine implementation

use super::config::{ModelType, TrainingConfig};
use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::models::{Model, ModelMetrics};
use super::random_forest::RandomForest;
use super::split::StratifiedSplitter;
use crate::dataset::PassengerDataset;
use crate::error::{Result, SurvivalError};
use crate::fairness::{FairnessEvaluator, FairnessMetrics, FairnessViolation};
use crate::preprocessing::{Preprocessor, SensitiveAttributes};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingClassifier),
}

impl TrainedModel {
    /// Unfitted model of the given type, configured from `config`
    pub fn from_config(model_type: ModelType, config: &TrainingConfig) -> Self {
        match model_type {
            ModelType::LogisticRegression => {
                let lr = &config.logistic;
                TrainedModel::LogisticRegression(
                    LogisticRegression::new()
                        .with_alpha(lr.alpha)
                        .with_max_iter(lr.max_iter)
                        .with_learning_rate(lr.learning_rate),
                )
            }
            ModelType::RandomForest => {
                let rf = &config.random_forest;
                let mut model = RandomForest::new_classifier(rf.n_estimators)
                    .with_min_samples_split(rf.min_samples_split)
                    .with_min_samples_leaf(rf.min_samples_leaf)
                    .with_random_state(config.random_state);
                if let Some(depth) = rf.max_depth {
                    model = model.with_max_depth(depth);
                }
                TrainedModel::RandomForest(model)
            }
            ModelType::GradientBoosting => {
                let mut gb = config.gradient_boosting.clone();
                gb.random_state = config.random_state;
                TrainedModel::GradientBoosting(GradientBoostingClassifier::new(gb))
            }
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self {
            TrainedModel::LogisticRegression(_) => ModelType::LogisticRegression,
            TrainedModel::RandomForest(_) => ModelType::RandomForest,
            TrainedModel::GradientBoosting(_) => ModelType::GradientBoosting,
        }
    }

    fn as_model(&self) -> &dyn Model {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }

    fn as_model_mut(&mut self) -> &mut dyn Model {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }
}

impl Model for TrainedModel {
    fn name(&self) -> &'static str {
        self.as_model().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_model_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.as_model().predict_proba(x)
    }

    fn supports_importance(&self) -> bool {
        self.as_model().supports_importance()
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.as_model().feature_importances()
    }
}

/// Held-out evaluation of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub performance: ModelMetrics,
    pub fairness_sex: FairnessMetrics,
    pub fairness_class: FairnessMetrics,
    #[serde(default)]
    pub violations: Vec<FairnessViolation>,
}

/// Per-candidate evaluation keyed by model name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingReport {
    models: BTreeMap<String, ModelReport>,
}

impl TrainingReport {
    pub fn get(&self, model_name: &str) -> Option<&ModelReport> {
        self.models.get(model_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelReport)> {
        self.models.iter().map(|(name, report)| (name.as_str(), report))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Total number of fairness violations across candidates
    pub fn n_violations(&self) -> usize {
        self.models.values().map(|r| r.violations.len()).sum()
    }

    fn insert(&mut self, model_name: &str, report: ModelReport) {
        self.models.insert(model_name.to_string(), report);
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub report: TrainingReport,
    pub model: TrainedModel,
    pub model_name: String,
    pub preprocessor: Preprocessor,
    pub n_train: usize,
    pub n_test: usize,
}

impl TrainingOutcome {
    /// Held-out report of the selected model
    pub fn selected_report(&self) -> Option<&ModelReport> {
        self.report.get(&self.model_name)
    }
}

/// Held-out data shared by every candidate's evaluation
struct TestSplit {
    x: Array2<f64>,
    y: Array1<f64>,
    sensitive: SensitiveAttributes,
}

/// Main training engine
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Create a new training engine
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit the preprocessor, train and audit every candidate, select the best by F1
    pub fn train(&self, dataset: &PassengerDataset) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let records = dataset.records();
        let y = dataset.labels_array();

        let (preprocessor, x) = Preprocessor::fit(records)?;
        let sensitive = preprocessor.sensitive_attributes(records)?;

        let split = StratifiedSplitter::new(self.config.test_size, self.config.random_state).split(&y)?;
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let test = TestSplit {
            x: x.select(Axis(0), &split.test_indices),
            y: y.select(Axis(0), &split.test_indices),
            sensitive: sensitive.select(&split.test_indices),
        };

        info!(
            n_train = split.train_indices.len(),
            n_test = split.test_indices.len(),
            n_features = x.ncols(),
            "Training {} candidate models",
            self.config.candidates.len()
        );

        // Order of the collected results follows the candidate order
        let fitted = self
            .config
            .candidates
            .par_iter()
            .map(|&model_type| self.fit_candidate(model_type, &x_train, &y_train))
            .collect::<Result<Vec<TrainedModel>>>()?;

        let evaluator = FairnessEvaluator::new(self.config.fairness.clone());
        let mut report = TrainingReport::default();
        let mut f1_scores = Vec::with_capacity(fitted.len());

        for model in &fitted {
            let model_report = Self::evaluate_candidate(model, &test, &evaluator).map_err(|e| {
                SurvivalError::TrainingFailure {
                    model: model.name().to_string(),
                    reason: e.to_string(),
                }
            })?;
            let f1 = model_report.performance.f1_score;

            info!(
                model = model.name(),
                accuracy = model_report.performance.accuracy,
                f1 = f1,
                roc_auc = model_report.performance.roc_auc,
                violations = model_report.violations.len(),
                "Evaluated candidate"
            );

            f1_scores.push(f1);
            report.insert(model.name(), model_report);
        }

        let best_idx =
            select_best(&f1_scores).ok_or_else(|| SurvivalError::ConfigError("no candidate models".to_string()))?;
        let best_f1 = f1_scores[best_idx];
        let model = fitted.into_iter().nth(best_idx).ok_or(SurvivalError::ModelNotFitted)?;
        let model_name = model.name().to_string();

        if report.n_violations() > 0 {
            warn!(
                violations = report.n_violations(),
                "Fairness violations detected during evaluation"
            );
        }
        info!(
            model = %model_name,
            f1 = best_f1,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Selected best model"
        );

        Ok(TrainingOutcome {
            report,
            model,
            model_name,
            preprocessor,
            n_train: split.train_indices.len(),
            n_test: split.test_indices.len(),
        })
    }

    fn fit_candidate(&self, model_type: ModelType, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let start = Instant::now();
        let mut model = TrainedModel::from_config(model_type, &self.config);
        model.fit(x, y).map_err(|e| SurvivalError::TrainingFailure {
            model: model_type.name().to_string(),
            reason: e.to_string(),
        })?;
        debug!(
            model = model_type.name(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Fitted candidate"
        );
        Ok(model)
    }

    fn evaluate_candidate(model: &TrainedModel, test: &TestSplit, evaluator: &FairnessEvaluator) -> Result<ModelReport> {
        let proba = model.predict_proba(&test.x)?;
        let y_score = proba.column(1).to_owned();
        let y_pred = y_score.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 });

        let performance = ModelMetrics::compute_classification(&test.y, &y_pred, &y_score);
        let fairness_sex = evaluator.evaluate(&test.y, &y_pred, &test.sensitive.sex)?;
        let fairness_class = evaluator.evaluate(&test.y, &y_pred, &test.sensitive.first_class())?;

        let mut violations = evaluator.violations("sex", &fairness_sex);
        violations.extend(evaluator.violations("first_class", &fairness_class));

        Ok(ModelReport {
            performance,
            fairness_sex,
            fairness_class,
            violations,
        })
    }
}

/// Index of the highest score; ties keep the earliest index
fn select_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if best.map_or(true, |b| score > scores[b]) {
            best = Some(idx);
        }
    }
    best
}
