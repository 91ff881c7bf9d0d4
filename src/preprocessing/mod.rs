//! Data preprocessing module
//!
//! Provides the fitted transform shared by training and inference:
//! - Label encoding of categorical columns against a closed vocabulary
//! - Standard scaling with population statistics
//! - [`Preprocessor`], which owns the canonical feature order

mod encoder;
mod pipeline;
mod scaler;

pub use encoder::LabelEncoder;
pub use pipeline::{Preprocessor, SensitiveAttributes};
pub use scaler::{ScalerParams, StandardScaler};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model input column, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Pclass,
    Sex,
    Age,
    SibSp,
    Parch,
    Fare,
    Embarked,
    FamilySize,
    IsAlone,
    Title,
    HasCabin,
    FarePerPerson,
    AgeGroup,
}

impl Feature {
    /// All model inputs in column order
    pub const ALL: [Feature; 13] = [
        Feature::Pclass,
        Feature::Sex,
        Feature::Age,
        Feature::SibSp,
        Feature::Parch,
        Feature::Fare,
        Feature::Embarked,
        Feature::FamilySize,
        Feature::IsAlone,
        Feature::Title,
        Feature::HasCabin,
        Feature::FarePerPerson,
        Feature::AgeGroup,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Pclass => "Pclass",
            Feature::Sex => "Sex",
            Feature::Age => "Age",
            Feature::SibSp => "SibSp",
            Feature::Parch => "Parch",
            Feature::Fare => "Fare",
            Feature::Embarked => "Embarked",
            Feature::FamilySize => "FamilySize",
            Feature::IsAlone => "IsAlone",
            Feature::Title => "Title",
            Feature::HasCabin => "HasCabin",
            Feature::FarePerPerson => "FarePerPerson",
            Feature::AgeGroup => "AgeGroup",
        }
    }

    /// Whether the column goes through a [`LabelEncoder`]
    pub fn is_categorical(&self) -> bool {
        matches!(self, Feature::Sex | Feature::Embarked | Feature::Title | Feature::AgeGroup)
    }

    /// Position of the column in the model input
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
        let categorical: Vec<&str> = Feature::ALL
            .iter()
            .filter(|f| f.is_categorical())
            .map(|f| f.name())
            .collect();
        assert_eq!(categorical, vec!["Sex", "Embarked", "Title", "AgeGroup"]);
    }

    #[test]
    fn test_feature_serialize() {
        let json = serde_json::to_string(&Feature::FarePerPerson).unwrap();
        assert_eq!(json, "\"FarePerPerson\"");
    }
}
