//! Stratified train/test splitting

use crate::error::{Result, SurvivalError};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A single train/test split, both index lists in ascending order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Seeded splitter that keeps the class balance of each side
#[derive(Debug, Clone)]
pub struct StratifiedSplitter {
    test_size: f64,
    random_state: u64,
}

impl StratifiedSplitter {
    pub fn new(test_size: f64, random_state: u64) -> Self {
        Self {
            test_size,
            random_state,
        }
    }

    /// Split sample indices so each class contributes `round(n_class * test_size)`
    /// rows to the test side, at least one when the class has two or more rows.
    pub fn split(&self, y: &Array1<f64>) -> Result<TrainTestSplit> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(SurvivalError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }

        // Group samples by class; BTreeMap keeps the shuffle order reproducible
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut train_indices = Vec::with_capacity(y.len());
        let mut test_indices = Vec::new();

        for indices in class_indices.values_mut() {
            indices.shuffle(&mut rng);

            let n_class = indices.len();
            let mut n_test = (n_class as f64 * self.test_size).round() as usize;
            if n_class >= 2 {
                n_test = n_test.clamp(1, n_class - 1);
            } else {
                n_test = 0;
            }

            test_indices.extend_from_slice(&indices[..n_test]);
            train_indices.extend_from_slice(&indices[n_test..]);
        }

        if train_indices.is_empty() || test_indices.is_empty() {
            return Err(SurvivalError::DataError(format!(
                "cannot split {} samples into non-empty train and test sets",
                y.len()
            )));
        }

        train_indices.sort_unstable();
        test_indices.sort_unstable();

        Ok(TrainTestSplit {
            train_indices,
            test_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_proportions() {
        let y: Array1<f64> = (0..100).map(|i| if i < 40 { 1.0 } else { 0.0 }).collect();
        let split = StratifiedSplitter::new(0.2, 42).split(&y).unwrap();

        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 80);
        let test_pos = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_pos, 8);
    }

    #[test]
    fn test_disjoint_and_sorted() {
        let y: Array1<f64> = (0..37).map(|i| (i % 3 == 0) as u8 as f64).collect();
        let split = StratifiedSplitter::new(0.2, 7).split(&y).unwrap();

        let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
        assert!(split.test_indices.windows(2).all(|w| w[0] < w[1]));
        assert!(split.train_indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_same_seed_same_split() {
        let y: Array1<f64> = (0..50).map(|i| (i % 2) as f64).collect();
        let a = StratifiedSplitter::new(0.2, 42).split(&y).unwrap();
        let b = StratifiedSplitter::new(0.2, 42).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_class_keeps_one_test_row() {
        let y = Array1::from(vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let split = StratifiedSplitter::new(0.2, 1).split(&y).unwrap();
        assert_eq!(split.test_indices.iter().filter(|&&i| y[i] == 1.0).count(), 1);
    }

    #[test]
    fn test_too_small_to_split() {
        let y = Array1::from(vec![1.0]);
        assert!(StratifiedSplitter::new(0.2, 42).split(&y).is_err());
    }
}
