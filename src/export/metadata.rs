//! Provenance record persisted next to the model

use crate::error::{Result, SurvivalError};
use crate::training::TrainingOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of the run that produced a saved model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub selected_model: String,
    /// Held-out F1 of the selected model
    pub f1_score: f64,
    pub feature_names: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    pub trained_at: DateTime<Utc>,
    /// Crate version that wrote the artifacts
    pub version: String,
}

impl ModelMetadata {
    pub fn from_outcome(outcome: &TrainingOutcome) -> Result<Self> {
        let selected = outcome.selected_report().ok_or_else(|| {
            SurvivalError::DataError(format!("no report for selected model {}", outcome.model_name))
        })?;

        Ok(Self {
            selected_model: outcome.model_name.clone(),
            f1_score: selected.performance.f1_score,
            feature_names: outcome.preprocessor.feature_names().to_vec(),
            n_train: outcome.n_train,
            n_test: outcome.n_test,
            trained_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}
