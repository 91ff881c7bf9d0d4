//! Artifact persistence module
//!
//! Saves a training run as a directory of JSON files (model, preprocessor,
//! evaluation report, metadata) and loads it back into a [`Predictor`](crate::inference::Predictor).

mod metadata;
mod store;

pub use metadata::ModelMetadata;
pub use store::{ArtifactStore, LoadedArtifacts, METADATA_FILE, METRICS_FILE, MODEL_FILE, PREPROCESSOR_FILE};
