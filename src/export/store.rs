//! Directory-backed artifact persistence

use super::metadata::ModelMetadata;
use crate::error::{Result, SurvivalError};
use crate::inference::{InferenceConfig, Predictor};
use crate::preprocessing::Preprocessor;
use crate::training::{Model, TrainedModel, TrainingOutcome, TrainingReport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const MODEL_FILE: &str = "model.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Artifacts read back from a store
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub model: TrainedModel,
    pub preprocessor: Preprocessor,
    pub report: TrainingReport,
    pub metadata: ModelMetadata,
}

/// A directory holding one trained model and everything needed to serve it
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write model, preprocessor, report and metadata, creating the directory if needed
    pub fn save(&self, outcome: &TrainingOutcome) -> Result<ModelMetadata> {
        fs::create_dir_all(&self.root)?;

        let metadata = ModelMetadata::from_outcome(outcome)?;
        self.write_json(MODEL_FILE, &outcome.model)?;
        self.write_json(PREPROCESSOR_FILE, &outcome.preprocessor)?;
        self.write_json(METRICS_FILE, &outcome.report)?;
        self.write_json(METADATA_FILE, &metadata)?;

        info!(
            dir = %self.root.display(),
            model = %metadata.selected_model,
            "Saved artifacts"
        );
        Ok(metadata)
    }

    /// Read every artifact back and check that they belong together
    pub fn load(&self) -> Result<LoadedArtifacts> {
        let model: TrainedModel = self.read_json(MODEL_FILE)?;
        let preprocessor: Preprocessor = self.read_json(PREPROCESSOR_FILE)?;
        let report: TrainingReport = self.read_json(METRICS_FILE)?;
        let metadata: ModelMetadata = self.read_json(METADATA_FILE)?;

        if metadata.selected_model != model.name() {
            return Err(SurvivalError::DataError(format!(
                "metadata names {} but model file holds {}",
                metadata.selected_model,
                model.name()
            )));
        }
        if metadata.feature_names.as_slice() != preprocessor.feature_names() {
            return Err(SurvivalError::DataError(
                "metadata feature names do not match the preprocessor".to_string(),
            ));
        }

        Ok(LoadedArtifacts {
            model,
            preprocessor,
            report,
            metadata,
        })
    }

    /// Rebuild a predictor from the saved model and preprocessor
    pub fn load_predictor(&self, config: InferenceConfig) -> Result<Predictor> {
        let artifacts = self.load()?;
        Ok(Predictor::from_shared(
            Arc::new(artifacts.model),
            Arc::new(artifacts.preprocessor),
            config,
        ))
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        let mut writer = BufWriter::new(File::create(self.root.join(file_name))?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let reader = BufReader::new(File::open(self.root.join(file_name))?);
        Ok(serde_json::from_reader(reader)?)
    }
}
