//! Inference configuration

use serde::{Deserialize, Serialize};

/// Configuration for serving predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of feature importances attached to each prediction
    pub top_k_importances: usize,

    /// Whether batch prediction fans out over the rayon pool
    pub parallel_batch: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k_importances: 10,
            parallel_batch: true,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set how many importances are reported
    pub fn with_top_k_importances(mut self, k: usize) -> Self {
        self.top_k_importances = k;
        self
    }

    /// Builder method to toggle parallel batch prediction
    pub fn with_parallel_batch(mut self, parallel: bool) -> Self {
        self.parallel_batch = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.top_k_importances, 10);
        assert!(config.parallel_batch);
    }

    #[test]
    fn test_builder_pattern() {
        let config = InferenceConfig::new()
            .with_top_k_importances(3)
            .with_parallel_batch(false);

        assert_eq!(config.top_k_importances, 3);
        assert!(!config.parallel_batch);
    }
}
