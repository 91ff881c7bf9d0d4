//! Passenger records and labeled datasets
//!
//! Provides:
//! - [`RawRecord`] - a single passenger as received from the data source
//! - [`PassengerInput`] - the inference request schema, with every field optional
//! - [`PassengerDataset`] - records paired with survival labels, loadable from JSON

use crate::error::{Result, SurvivalError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Upper bound on SibSp and Parch accepted for prediction
pub const MAX_RELATIVES: u32 = 20;

/// A raw passenger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRecord {
    /// Ticket class (1, 2 or 3)
    pub pclass: u8,
    /// "male" or "female"
    pub sex: String,
    /// Age in years; imputed with the training median when absent
    #[serde(default)]
    pub age: Option<f64>,
    /// Siblings and spouses aboard
    pub sib_sp: u32,
    /// Parents and children aboard
    pub parch: u32,
    /// Ticket fare; imputed with the training median when absent
    #[serde(default)]
    pub fare: Option<f64>,
    /// Port of embarkation (C, Q or S); imputed with the training mode when absent
    #[serde(default)]
    pub embarked: Option<String>,
    /// Full name including the honorific, e.g. "Braund, Mr. Owen Harris"
    pub name: String,
    /// Cabin identifier, e.g. "C85"
    #[serde(default)]
    pub cabin: Option<String>,
}

impl RawRecord {
    /// Create a record with no relatives, no cabin and absent optional values
    pub fn new(pclass: u8, sex: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pclass,
            sex: sex.into(),
            age: None,
            sib_sp: 0,
            parch: 0,
            fare: None,
            embarked: None,
            name: name.into(),
            cabin: None,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_fare(mut self, fare: f64) -> Self {
        self.fare = Some(fare);
        self
    }

    pub fn with_family(mut self, sib_sp: u32, parch: u32) -> Self {
        self.sib_sp = sib_sp;
        self.parch = parch;
        self
    }

    pub fn with_embarked(mut self, embarked: impl Into<String>) -> Self {
        self.embarked = Some(embarked.into());
        self
    }

    pub fn with_cabin(mut self, cabin: impl Into<String>) -> Self {
        self.cabin = Some(cabin.into());
        self
    }

    /// Check value ranges that the type system does not enforce.
    ///
    /// Categorical spellings (Sex, Embarked) are left to the encoder, which
    /// reports values outside its fitted vocabulary.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.pclass) {
            return Err(SurvivalError::InvalidField {
                field: "Pclass",
                reason: format!("expected 1, 2 or 3, got {}", self.pclass),
            });
        }
        if let Some(age) = self.age {
            if !age.is_finite() || age < 0.0 {
                return Err(SurvivalError::InvalidField {
                    field: "Age",
                    reason: format!("expected a non-negative number, got {}", age),
                });
            }
        }
        if let Some(fare) = self.fare {
            if !fare.is_finite() || fare < 0.0 {
                return Err(SurvivalError::InvalidField {
                    field: "Fare",
                    reason: format!("expected a non-negative number, got {}", fare),
                });
            }
        }
        for (field, count) in [("SibSp", self.sib_sp), ("Parch", self.parch)] {
            if count > MAX_RELATIVES {
                return Err(SurvivalError::InvalidField {
                    field,
                    reason: format!("expected at most {}, got {}", MAX_RELATIVES, count),
                });
            }
        }
        Ok(())
    }
}

/// Inference request as it arrives from a caller.
///
/// Every field is optional at the wire level so that a missing required field
/// is reported for that record instead of failing deserialization of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PassengerInput {
    pub pclass: Option<u8>,
    pub sex: Option<String>,
    pub age: Option<f64>,
    pub sib_sp: Option<u32>,
    pub parch: Option<u32>,
    pub fare: Option<f64>,
    pub embarked: Option<String>,
    pub name: Option<String>,
    pub cabin: Option<String>,
}

impl TryFrom<PassengerInput> for RawRecord {
    type Error = SurvivalError;

    fn try_from(input: PassengerInput) -> Result<Self> {
        let record = RawRecord {
            pclass: input.pclass.ok_or(SurvivalError::MissingRequiredField("Pclass"))?,
            sex: input.sex.ok_or(SurvivalError::MissingRequiredField("Sex"))?,
            age: input.age,
            sib_sp: input.sib_sp.ok_or(SurvivalError::MissingRequiredField("SibSp"))?,
            parch: input.parch.ok_or(SurvivalError::MissingRequiredField("Parch"))?,
            fare: input.fare,
            embarked: Some(input.embarked.ok_or(SurvivalError::MissingRequiredField("Embarked"))?),
            name: input.name.ok_or(SurvivalError::MissingRequiredField("Name"))?,
            cabin: input.cabin,
        };
        record.validate()?;
        Ok(record)
    }
}

impl From<&RawRecord> for PassengerInput {
    fn from(record: &RawRecord) -> Self {
        Self {
            pclass: Some(record.pclass),
            sex: Some(record.sex.clone()),
            age: record.age,
            sib_sp: Some(record.sib_sp),
            parch: Some(record.parch),
            fare: record.fare,
            embarked: record.embarked.clone(),
            name: Some(record.name.clone()),
            cabin: record.cabin.clone(),
        }
    }
}

/// On-disk row: a raw record plus its survival label
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabeledRow {
    #[serde(flatten)]
    record: RawRecord,
    #[serde(rename = "Survived")]
    survived: u8,
}

/// Passenger records with aligned survival labels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassengerDataset {
    records: Vec<RawRecord>,
    labels: Vec<u8>,
}

impl PassengerDataset {
    /// Create a dataset, checking alignment and label values
    pub fn new(records: Vec<RawRecord>, labels: Vec<u8>) -> Result<Self> {
        if records.len() != labels.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("{} labels", records.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(SurvivalError::InvalidField {
                field: "Survived",
                reason: format!("expected 0 or 1, got {}", bad),
            });
        }
        Ok(Self { records, labels })
    }

    /// Load a JSON array of passenger rows, each carrying a `Survived` label
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let rows: Vec<LabeledRow> = serde_json::from_reader(reader)?;

        let (records, labels): (Vec<RawRecord>, Vec<u8>) =
            rows.into_iter().map(|row| (row.record, row.survived)).unzip();

        info!(path = %path.display(), rows = records.len(), "Loaded passenger dataset");
        Self::new(records, labels)
    }

    /// Write the dataset in the format read by [`PassengerDataset::from_json_file`]
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let rows: Vec<LabeledRow> = self
            .records
            .iter()
            .zip(&self.labels)
            .map(|(record, &survived)| LabeledRow {
                record: record.clone(),
                survived,
            })
            .collect();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &rows)?;
        Ok(())
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Labels as the float vector consumed by models
    pub fn labels_array(&self) -> Array1<f64> {
        self.labels.iter().map(|&l| l as f64).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fraction of passengers labeled as survivors
    pub fn survival_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}
