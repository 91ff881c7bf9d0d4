//! Model training module
//!
//! Candidate binary classifiers and the engine that fits, audits and selects them:
//! - Logistic regression (gradient descent, L2 penalty)
//! - Random forest of probability trees
//! - Gradient boosted trees on the log-loss

mod config;
mod engine;
mod models;
mod split;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;
pub mod gradient_boosting;

pub use config::{LogisticConfig, ModelType, RandomForestConfig, TrainingConfig};
pub use engine::{ModelReport, TrainedModel, Trainer, TrainingOutcome, TrainingReport};
pub use models::{roc_auc, Model, ModelMetrics};
pub use split::{StratifiedSplitter, TrainTestSplit};
pub use linear_models::LogisticRegression;
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use random_forest::{MaxFeatures, RandomForest};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
