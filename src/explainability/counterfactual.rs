//! What-if scenarios around a single passenger

use crate::dataset::RawRecord;
use crate::inference::PredictionResult;
use serde::{Deserialize, Serialize};

/// Outcome of one altered scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterfactual {
    pub description: String,
    /// P(survived) under the scenario
    pub new_probability: f64,
    /// `new_probability` minus the original P(survived)
    pub delta: f64,
}

/// Prediction plus its counterfactuals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResult {
    #[serde(flatten)]
    pub prediction: PredictionResult,
    pub counterfactuals: Vec<Counterfactual>,
}

/// Altered copies of `record`: every other class ascending, then the sex flip
pub(crate) fn scenarios(record: &RawRecord) -> Vec<(String, RawRecord)> {
    let mut out: Vec<(String, RawRecord)> = (1..=3u8)
        .filter(|&class| class != record.pclass)
        .map(|class| {
            let mut altered = record.clone();
            altered.pclass = class;
            (format!("Passenger in Class {}", class), altered)
        })
        .collect();

    let flipped = if record.sex == "male" { "female" } else { "male" };
    let mut altered = record.clone();
    altered.sex = flipped.to_string();
    out.push((format!("If {}", flipped), altered));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_class_scenarios() {
        let record = RawRecord::new(2, "male", "Smith, Mr. John");
        let descriptions: Vec<String> = scenarios(&record).into_iter().map(|(d, _)| d).collect();
        assert_eq!(descriptions, vec!["Passenger in Class 1", "Passenger in Class 3", "If female"]);
    }

    #[test]
    fn test_only_one_field_changes() {
        let record = RawRecord::new(1, "female", "Smith, Miss. Anna").with_age(20.0);
        let altered = scenarios(&record);

        assert_eq!(altered[0].1.pclass, 2);
        assert_eq!(altered[0].1.sex, "female");
        assert_eq!(altered[2].0, "If male");
        assert_eq!(altered[2].1.pclass, 1);
        assert_eq!(altered[2].1.age, Some(20.0));
    }

    #[test]
    fn test_unknown_sex_flips_to_male() {
        let record = RawRecord::new(3, "unknown", "Doe, Mr. J");
        let last = scenarios(&record).pop().unwrap();
        assert_eq!(last.0, "If male");
    }
}
