//! Feature engineering for passenger records
//!
//! Derives family, title, age-band, fare and cabin features from a
//! [`RawRecord`]. Missing Age, Fare and Embarked are filled from statistics
//! captured once by [`FeatureEngineer::fit`] and never recomputed afterwards,
//! so the same record always engineers to the same values.

mod title;

pub use title::{consolidate_title, extract_title, title_of, UNKNOWN_TITLE};

use crate::dataset::RawRecord;
use crate::error::{Result, SurvivalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Deck reported for passengers without a cabin
pub const UNKNOWN_DECK: &str = "Unknown";

/// Age band of a passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    /// [0, 12)
    Child,
    /// [12, 18)
    Teen,
    /// [18, 35)
    Adult,
    /// [35, 60)
    MiddleAge,
    /// 60 and above
    Senior,
}

impl AgeGroup {
    /// Bucket an age. Values below zero fall into `Child`.
    pub fn from_age(age: f64) -> Self {
        if age < 12.0 {
            AgeGroup::Child
        } else if age < 18.0 {
            AgeGroup::Teen
        } else if age < 35.0 {
            AgeGroup::Adult
        } else if age < 60.0 {
            AgeGroup::MiddleAge
        } else {
            AgeGroup::Senior
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "Child",
            AgeGroup::Teen => "Teen",
            AgeGroup::Adult => "Adult",
            AgeGroup::MiddleAge => "MiddleAge",
            AgeGroup::Senior => "Senior",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fill values learned from the training corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    pub age_median: f64,
    pub fare_median: f64,
    pub embarked_mode: String,
}

/// A raw record with imputed values and derived columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub pclass: u8,
    pub sex: String,
    pub age: f64,
    pub sib_sp: u32,
    pub parch: u32,
    pub fare: f64,
    pub embarked: String,
    pub family_size: u64,
    pub is_alone: bool,
    pub title: String,
    pub age_group: AgeGroup,
    pub fare_per_person: f64,
    pub has_cabin: bool,
    pub deck: String,
}

/// Fitted feature engineer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineer {
    stats: ImputationStats,
}

impl FeatureEngineer {
    /// Capture imputation statistics from a training corpus
    pub fn fit(records: &[RawRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(SurvivalError::DataError(
                "cannot fit feature engineer on an empty corpus".to_string(),
            ));
        }

        let ages: Vec<f64> = records
            .iter()
            .filter_map(|r| r.age)
            .filter(|a| a.is_finite())
            .collect();
        let fares: Vec<f64> = records
            .iter()
            .filter_map(|r| r.fare)
            .filter(|f| f.is_finite())
            .collect();

        let age_median = median(ages)
            .ok_or_else(|| SurvivalError::DataError("no observed Age values".to_string()))?;
        let fare_median = median(fares)
            .ok_or_else(|| SurvivalError::DataError("no observed Fare values".to_string()))?;
        let embarked_mode = mode(records.iter().filter_map(|r| r.embarked.as_deref()))
            .ok_or_else(|| SurvivalError::DataError("no observed Embarked values".to_string()))?;

        debug!(age_median, fare_median, embarked_mode = %embarked_mode, "Fitted imputation statistics");

        Ok(Self {
            stats: ImputationStats {
                age_median,
                fare_median,
                embarked_mode,
            },
        })
    }

    pub fn stats(&self) -> &ImputationStats {
        &self.stats
    }

    /// Derive the engineered view of a record
    pub fn engineer(&self, record: &RawRecord) -> EngineeredRecord {
        let family_size = u64::from(record.sib_sp) + u64::from(record.parch) + 1;

        let age = record
            .age
            .filter(|a| a.is_finite())
            .unwrap_or(self.stats.age_median);
        let fare = record
            .fare
            .filter(|f| f.is_finite())
            .unwrap_or(self.stats.fare_median);
        let embarked = record
            .embarked
            .clone()
            .unwrap_or_else(|| self.stats.embarked_mode.clone());

        let cabin = record.cabin.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let deck = cabin
            .and_then(|c| c.chars().next())
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNKNOWN_DECK.to_string());

        EngineeredRecord {
            pclass: record.pclass,
            sex: record.sex.clone(),
            age,
            sib_sp: record.sib_sp,
            parch: record.parch,
            fare,
            embarked,
            family_size,
            is_alone: family_size == 1,
            title: title_of(&record.name),
            age_group: AgeGroup::from_age(age),
            fare_per_person: fare / family_size as f64,
            has_cabin: cabin.is_some(),
            deck,
        }
    }

    pub fn engineer_batch(&self, records: &[RawRecord]) -> Vec<EngineeredRecord> {
        records.iter().map(|r| self.engineer(r)).collect()
    }
}

/// Median with the two middle values averaged for even counts
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Most frequent value; ties go to the lexicographically smallest
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<RawRecord> {
        vec![
            RawRecord::new(1, "female", "Cumings, Mrs. John").with_age(38.0).with_fare(71.28).with_embarked("C"),
            RawRecord::new(3, "male", "Braund, Mr. Owen").with_age(22.0).with_fare(7.25).with_embarked("S"),
            RawRecord::new(3, "female", "Heikkinen, Miss. Laina").with_age(26.0).with_fare(7.92).with_embarked("S"),
            RawRecord::new(1, "male", "Allen, Mr. William").with_fare(53.1).with_embarked("C"),
        ]
    }

    #[test]
    fn test_age_groups() {
        assert_eq!(AgeGroup::from_age(0.0), AgeGroup::Child);
        assert_eq!(AgeGroup::from_age(11.99), AgeGroup::Child);
        assert_eq!(AgeGroup::from_age(12.0), AgeGroup::Teen);
        assert_eq!(AgeGroup::from_age(18.0), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(35.0), AgeGroup::MiddleAge);
        assert_eq!(AgeGroup::from_age(60.0), AgeGroup::Senior);
        assert_eq!(AgeGroup::from_age(95.0), AgeGroup::Senior);
    }

    #[test]
    fn test_fit_statistics() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let stats = engineer.stats();
        assert_eq!(stats.age_median, 26.0);
        assert!((stats.fare_median - (53.1 + 7.92) / 2.0).abs() < 1e-12);
        // C and S are tied, the smaller wins
        assert_eq!(stats.embarked_mode, "C");
    }

    #[test]
    fn test_fit_rejects_empty_and_unobserved() {
        assert!(matches!(FeatureEngineer::fit(&[]), Err(SurvivalError::DataError(_))));

        let no_ages = vec![RawRecord::new(1, "male", "Mr. A").with_fare(1.0).with_embarked("S")];
        assert!(matches!(FeatureEngineer::fit(&no_ages), Err(SurvivalError::DataError(_))));
    }

    #[test]
    fn test_engineer_derived_columns() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let record = RawRecord::new(2, "female", "Nasser, Mrs. Nicholas")
            .with_age(14.0)
            .with_fare(30.07)
            .with_family(1, 1)
            .with_embarked("Q")
            .with_cabin("C85");
        let row = engineer.engineer(&record);

        assert_eq!(row.family_size, 3);
        assert!(!row.is_alone);
        assert_eq!(row.title, "Mrs");
        assert_eq!(row.age_group, AgeGroup::Teen);
        assert!((row.fare_per_person - 30.07 / 3.0).abs() < 1e-12);
        assert!(row.has_cabin);
        assert_eq!(row.deck, "C");
        assert_eq!(row.embarked, "Q");
    }

    #[test]
    fn test_engineer_imputes_absent_values() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let row = engineer.engineer(&RawRecord::new(3, "male", "Moran, Mr. James").with_cabin("  "));

        assert_eq!(row.age, 26.0);
        assert_eq!(row.fare, engineer.stats().fare_median);
        assert_eq!(row.embarked, "C");
        assert!(row.is_alone);
        assert!(!row.has_cabin);
        assert_eq!(row.deck, UNKNOWN_DECK);
    }

    #[test]
    fn test_engineer_extreme_family_counts() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let record = RawRecord::new(3, "male", "Sage, Mr. John")
            .with_fare(69.55)
            .with_family(u32::MAX, u32::MAX);
        let row = engineer.engineer(&record);

        assert_eq!(row.family_size, 2 * u64::from(u32::MAX) + 1);
        assert!(!row.is_alone);
        assert!(row.fare_per_person.is_finite() && row.fare_per_person > 0.0);
    }

    #[test]
    fn test_engineer_is_deterministic() {
        let engineer = FeatureEngineer::fit(&corpus()).unwrap();
        let record = &corpus()[1];
        assert_eq!(engineer.engineer(record), engineer.engineer(record));
    }
}
