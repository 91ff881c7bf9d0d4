//! survival-fairness - Survival prediction with fairness auditing
//!
//! This crate provides a complete tabular pipeline for passenger survival:
//! - Feature engineering and a fit-once encoding/scaling transform
//! - Training of several candidate classifiers with held-out evaluation
//! - Group-fairness auditing by sex and by ticket class
//! - Prediction with feature importances, counterfactuals and contributions
//!
//! # Modules
//!
//! ## Data
//! - [`dataset`] - Raw passenger records and labeled corpora
//! - [`synthetic`] - Seeded Titanic-like corpus generation
//! - [`feature_engineering`] - Derived columns and imputation statistics
//! - [`preprocessing`] - Categorical encoding, scaling, the fitted pipeline
//!
//! ## Models
//! - [`training`] - Candidate models, the training engine and metrics
//! - [`fairness`] - Disparate impact, equal opportunity and demographic parity
//!
//! ## Serving
//! - [`inference`] - Single and batch prediction
//! - [`explainability`] - Counterfactuals and baseline-relative contributions
//! - [`export`] - Artifact persistence
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod dataset;
pub mod synthetic;
pub mod feature_engineering;
pub mod preprocessing;

// Models
pub mod training;
pub mod fairness;

// Serving
pub mod inference;
pub mod explainability;
pub mod export;
pub mod cli;

pub use error::{Result, SurvivalError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SurvivalError};

    // Data
    pub use crate::dataset::{PassengerDataset, PassengerInput, RawRecord};
    pub use crate::synthetic::{generate, SyntheticConfig};
    pub use crate::feature_engineering::{EngineeredRecord, FeatureEngineer};
    pub use crate::preprocessing::{Feature, Preprocessor, SensitiveAttributes};

    // Training
    pub use crate::training::{Model, ModelMetrics, ModelType, TrainedModel, Trainer, TrainingConfig, TrainingReport};

    // Fairness
    pub use crate::fairness::{FairnessEvaluator, FairnessMetrics, FairnessThresholds, FairnessViolation};

    // Inference
    pub use crate::inference::{InferenceConfig, PredictionResult, Predictor};

    // Explainability
    pub use crate::explainability::{ContributionResult, Explainer, ExplanationResult};

    // Export
    pub use crate::export::{ArtifactStore, ModelMetadata};
}
