//! Error types for the survival prediction pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SurvivalError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum SurvivalError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Unseen category '{value}' in column {column}")]
    UnseenCategory { column: String, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Training failed for {model}: {reason}")]
    TrainingFailure { model: String, reason: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SurvivalError {
    /// Whether the error is scoped to a single record.
    ///
    /// Batch callers collect these per record instead of aborting the batch.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            SurvivalError::MissingRequiredField(_)
                | SurvivalError::UnseenCategory { .. }
                | SurvivalError::InvalidField { .. }
        )
    }
}

impl From<serde_json::Error> for SurvivalError {
    fn from(err: serde_json::Error) -> Self {
        SurvivalError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SurvivalError {
    fn from(err: ndarray::ShapeError) -> Self {
        SurvivalError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
