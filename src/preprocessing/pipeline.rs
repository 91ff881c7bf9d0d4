//! Fitted feature pipeline: engineering, encoding and scaling

use super::encoder::LabelEncoder;
use super::scaler::StandardScaler;
use super::Feature;
use crate::dataset::RawRecord;
use crate::error::{Result, SurvivalError};
use crate::feature_engineering::{EngineeredRecord, FeatureEngineer, ImputationStats};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Sensitive attribute vectors aligned with a record slice
#[derive(Debug, Clone, PartialEq)]
pub struct SensitiveAttributes {
    /// 1.0 for male, 0.0 for female
    pub sex: Array1<f64>,
    /// Raw ticket class
    pub pclass: Array1<f64>,
}

impl SensitiveAttributes {
    /// Partition into first class (1.0) and the rest (0.0)
    pub fn first_class(&self) -> Array1<f64> {
        self.pclass.mapv(|c| if c == 1.0 { 1.0 } else { 0.0 })
    }

    /// Subset by row indices, keeping the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            sex: indices.iter().map(|&i| self.sex[i]).collect(),
            pclass: indices.iter().map(|&i| self.pclass[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sex.is_empty()
    }
}

/// Feature pipeline fitted once on a training corpus.
///
/// Holds the imputation statistics, one vocabulary per categorical column and
/// the standardization parameters. All state is read-only after [`Preprocessor::fit`];
/// the fit matrix and any later transform of the same record go through the
/// same row path and are bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    engineer: FeatureEngineer,
    encoders: BTreeMap<String, LabelEncoder>,
    scaler: StandardScaler,
    feature_names: Vec<String>,
}

impl Preprocessor {
    /// Fit on a corpus and return the transformed training matrix
    pub fn fit(records: &[RawRecord]) -> Result<(Self, Array2<f64>)> {
        let start = Instant::now();

        let engineer = FeatureEngineer::fit(records)?;
        let engineered = engineer.engineer_batch(records);

        let mut encoders = BTreeMap::new();
        for feature in Feature::ALL.iter().filter(|f| f.is_categorical()) {
            let values = engineered.iter().filter_map(|row| match column_value(*feature, row) {
                ColumnValue::Category(value) => Some(value),
                ColumnValue::Number(_) => None,
            });
            encoders.insert(feature.name().to_string(), LabelEncoder::fit(feature.name(), values)?);
        }

        let mut raw = Array2::zeros((engineered.len(), Feature::ALL.len()));
        for (i, row) in engineered.iter().enumerate() {
            raw.row_mut(i).assign(&encode_row(&encoders, row)?);
        }

        let scaler = StandardScaler::fit(&raw)?;
        let matrix = scaler.transform(&raw)?;

        let preprocessor = Self {
            engineer,
            encoders,
            scaler,
            feature_names: Feature::ALL.iter().map(|f| f.name().to_string()).collect(),
        };

        info!(
            rows = records.len(),
            features = preprocessor.feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted preprocessor"
        );

        Ok((preprocessor, matrix))
    }

    /// Engineer a raw record with the fitted imputation statistics
    pub fn engineer(&self, record: &RawRecord) -> EngineeredRecord {
        self.engineer.engineer(record)
    }

    /// Encode and scale an engineered record into the model feature vector
    pub fn transform(&self, row: &EngineeredRecord) -> Result<Array1<f64>> {
        let raw = encode_row(&self.encoders, row)?;
        self.scaler.transform_row(raw.view())
    }

    pub fn transform_record(&self, record: &RawRecord) -> Result<Array1<f64>> {
        self.transform(&self.engineer(record))
    }

    /// Transform a batch; the first failing record aborts
    pub fn transform_batch(&self, records: &[RawRecord]) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((records.len(), self.feature_names.len()));
        for (i, record) in records.iter().enumerate() {
            out.row_mut(i).assign(&self.transform_record(record)?);
        }
        Ok(out)
    }

    /// Extract the audited attributes, in record order
    pub fn sensitive_attributes(&self, records: &[RawRecord]) -> Result<SensitiveAttributes> {
        let sex = records
            .iter()
            .map(|r| match r.sex.as_str() {
                "male" => Ok(1.0),
                "female" => Ok(0.0),
                other => Err(SurvivalError::InvalidField {
                    field: "Sex",
                    reason: format!("expected male or female, got {}", other),
                }),
            })
            .collect::<Result<Array1<f64>>>()?;
        let pclass = records.iter().map(|r| r.pclass as f64).collect();

        Ok(SensitiveAttributes { sex, pclass })
    }

    /// Ordered names of the model input columns
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn imputation_stats(&self) -> &ImputationStats {
        self.engineer.stats()
    }

    /// Vocabulary of a categorical column
    pub fn encoder(&self, feature: Feature) -> Option<&LabelEncoder> {
        self.encoders.get(feature.name())
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

/// Engineered value of one model input column
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnValue<'a> {
    Category(&'a str),
    Number(f64),
}

fn column_value(feature: Feature, row: &EngineeredRecord) -> ColumnValue<'_> {
    match feature {
        Feature::Pclass => ColumnValue::Number(f64::from(row.pclass)),
        Feature::Sex => ColumnValue::Category(&row.sex),
        Feature::Age => ColumnValue::Number(row.age),
        Feature::SibSp => ColumnValue::Number(f64::from(row.sib_sp)),
        Feature::Parch => ColumnValue::Number(f64::from(row.parch)),
        Feature::Fare => ColumnValue::Number(row.fare),
        Feature::Embarked => ColumnValue::Category(&row.embarked),
        Feature::FamilySize => ColumnValue::Number(row.family_size as f64),
        Feature::IsAlone => ColumnValue::Number(f64::from(u8::from(row.is_alone))),
        Feature::Title => ColumnValue::Category(&row.title),
        Feature::HasCabin => ColumnValue::Number(f64::from(u8::from(row.has_cabin))),
        Feature::FarePerPerson => ColumnValue::Number(row.fare_per_person),
        Feature::AgeGroup => ColumnValue::Category(row.age_group.as_str()),
    }
}

/// Unscaled numeric row in [`Feature::ALL`] order
fn encode_row(encoders: &BTreeMap<String, LabelEncoder>, row: &EngineeredRecord) -> Result<Array1<f64>> {
    Feature::ALL
        .iter()
        .map(|feature| match column_value(*feature, row) {
            ColumnValue::Category(value) => {
                let encoder = encoders.get(feature.name()).ok_or(SurvivalError::ModelNotFitted)?;
                encoder.encode(value).map(|code| code as f64)
            }
            ColumnValue::Number(value) => Ok(value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<RawRecord> {
        vec![
            RawRecord::new(1, "female", "Cumings, Mrs. John").with_age(38.0).with_fare(71.28).with_family(1, 0).with_embarked("C").with_cabin("C85"),
            RawRecord::new(3, "male", "Braund, Mr. Owen").with_age(22.0).with_fare(7.25).with_family(1, 0).with_embarked("S"),
            RawRecord::new(3, "female", "Heikkinen, Miss. Laina").with_age(26.0).with_fare(7.92).with_embarked("S"),
            RawRecord::new(1, "male", "Allen, Mr. William").with_age(35.0).with_fare(53.1).with_embarked("Q"),
            RawRecord::new(2, "male", "Palsson, Master. Gosta").with_age(2.0).with_fare(21.07).with_family(3, 1).with_embarked("S"),
        ]
    }

    #[test]
    fn test_fit_matrix_shape_and_names() {
        let (pre, matrix) = Preprocessor::fit(&corpus()).unwrap();
        assert_eq!(matrix.dim(), (5, 13));
        assert_eq!(pre.feature_names()[0], "Pclass");
        assert_eq!(pre.feature_names()[12], "AgeGroup");
        assert_eq!(pre.encoder(Feature::Sex).unwrap().classes(), &["female", "male"]);
    }

    #[test]
    fn test_column_kinds_match_feature_kinds() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let row = engineer.engineer(&corpus()[0]);
        for feature in Feature::ALL {
            let categorical = matches!(column_value(feature, &row), ColumnValue::Category(_));
            assert_eq!(categorical, feature.is_categorical(), "{}", feature);
        }
    }

    #[test]
    fn test_transform_matches_fit_matrix() {
        let records = corpus();
        let (pre, matrix) = Preprocessor::fit(&records).unwrap();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(pre.transform_record(record).unwrap(), matrix.row(i));
        }
        assert_eq!(pre.transform_batch(&records).unwrap(), matrix);
    }

    #[test]
    fn test_scaled_columns_are_centered() {
        let (_, matrix) = Preprocessor::fit(&corpus()).unwrap();
        for col in matrix.columns() {
            assert!(col.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn test_unseen_embarked() {
        let (pre, _) = Preprocessor::fit(&corpus()).unwrap();
        let record = RawRecord::new(3, "male", "Mr. Drift").with_embarked("X");
        assert!(matches!(
            pre.transform_record(&record),
            Err(SurvivalError::UnseenCategory { ref column, .. }) if column == "Embarked"
        ));
    }

    #[test]
    fn test_sensitive_attributes() {
        let records = corpus();
        let (pre, _) = Preprocessor::fit(&records).unwrap();
        let attrs = pre.sensitive_attributes(&records).unwrap();
        assert_eq!(attrs.sex.to_vec(), vec![0.0, 1.0, 0.0, 1.0, 1.0]);
        assert_eq!(attrs.first_class().to_vec(), vec![1.0, 0.0, 0.0, 1.0, 0.0]);

        let subset = attrs.select(&[4, 0]);
        assert_eq!(subset.pclass.to_vec(), vec![2.0, 1.0]);

        let odd = vec![RawRecord::new(1, "unknown", "Mr. X")];
        assert!(pre.sensitive_attributes(&odd).is_err());
    }

    #[test]
    fn test_serde_roundtrip_preserves_transform() {
        let records = corpus();
        let (pre, matrix) = Preprocessor::fit(&records).unwrap();
        let json = serde_json::to_string(&pre).unwrap();
        let restored: Preprocessor = serde_json::from_str(&json).unwrap();
        let row = restored.transform_record(&records[2]).unwrap();
        for (a, b) in row.iter().zip(matrix.row(2).iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
