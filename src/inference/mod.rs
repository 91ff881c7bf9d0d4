//! Inference engine module
//!
//! Serves survival predictions from a trained model and its fitted preprocessor:
//! - Single-record prediction with class probabilities and confidence
//! - Top-k feature importances when the model exposes them
//! - Order-preserving batch prediction (sequential or parallel via rayon)
//!   with per-record errors

mod config;
mod engine;

pub use config::InferenceConfig;
pub use engine::{FeatureImportance, PredictionResult, Predictor, SurvivalProbability};
