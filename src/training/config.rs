//! Training configuration

use super::gradient_boosting::GradientBoostingConfig;
use crate::error::{Result, SurvivalError};
use crate::fairness::FairnessThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Type of model to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Logistic Regression
    LogisticRegression,
    /// Random Forest
    RandomForest,
    /// Gradient Boosted Trees
    GradientBoosting,
}

impl ModelType {
    /// Every candidate in selection order
    pub const ALL: [ModelType; 3] = [
        ModelType::LogisticRegression,
        ModelType::RandomForest,
        ModelType::GradientBoosting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression => "logistic_regression",
            ModelType::RandomForest => "random_forest",
            ModelType::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub alpha: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            max_iter: 1000,
            learning_rate: 0.1,
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Held-out fraction for evaluation
    pub test_size: f64,

    /// Random seed for the split and every model
    pub random_state: u64,

    /// Candidates in selection order; ties keep the earliest
    pub candidates: Vec<ModelType>,

    pub logistic: LogisticConfig,

    pub random_forest: RandomForestConfig,

    pub gradient_boosting: GradientBoostingConfig,

    /// Thresholds used to flag fairness violations
    pub fairness: FairnessThresholds,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            candidates: ModelType::ALL.to_vec(),
            logistic: LogisticConfig::default(),
            random_forest: RandomForestConfig::default(),
            gradient_boosting: GradientBoostingConfig::default(),
            fairness: FairnessThresholds::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config; absent keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| SurvivalError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<ModelType>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Builder method to set the tree counts of both ensembles
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.random_forest.n_estimators = n;
        self.gradient_boosting.n_estimators = n;
        self
    }

    pub fn with_fairness_thresholds(mut self, thresholds: FairnessThresholds) -> Self {
        self.fairness = thresholds;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(SurvivalError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.candidates.is_empty() {
            return Err(SurvivalError::ConfigError("no candidate models".to_string()));
        }
        for (i, candidate) in self.candidates.iter().enumerate() {
            if self.candidates[..i].contains(candidate) {
                return Err(SurvivalError::ConfigError(format!("duplicate candidate {}", candidate)));
            }
        }
        if self.random_forest.n_estimators == 0 {
            return Err(SurvivalError::ConfigError(
                "random_forest.n_estimators must be positive".to_string(),
            ));
        }
        if self.logistic.learning_rate <= 0.0 || self.gradient_boosting.learning_rate <= 0.0 {
            return Err(SurvivalError::ConfigError("learning rates must be positive".to_string()));
        }
        let gb = &self.gradient_boosting;
        if !(gb.subsample > 0.0 && gb.subsample <= 1.0) || !(gb.colsample_bytree > 0.0 && gb.colsample_bytree <= 1.0) {
            return Err(SurvivalError::ConfigError(
                "gradient_boosting sampling ratios must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
