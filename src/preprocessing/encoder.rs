//! Categorical label encoding

use crate::error::{Result, SurvivalError};
use serde::{Deserialize, Serialize};

/// Closed vocabulary mapping category strings to their sorted position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the vocabulary of a column
    pub fn fit<I, S>(column: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let column = column.into();
        let mut classes: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(SurvivalError::PreprocessingError(format!(
                "no values to encode in column {}",
                column
            )));
        }

        Ok(Self { column, classes })
    }

    /// Code of a category, or `UnseenCategory` when it was not present at fit time
    pub fn encode(&self, value: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map_err(|_| SurvivalError::UnseenCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
