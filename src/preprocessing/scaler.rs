//! Feature standardization

use crate::error::{Result, SurvivalError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Column mean
    pub center: f64,
    /// Population standard deviation, 1.0 for constant columns
    pub scale: f64,
}

/// Z-score scaler: (x - mean) / std
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(SurvivalError::PreprocessingError(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| SurvivalError::PreprocessingError("empty column axis".to_string()))?;
        let std = x.std_axis(Axis(0), 0.0);

        let params = mean
            .iter()
            .zip(std.iter())
            .map(|(&center, &s)| ScalerParams {
                center,
                scale: if s == 0.0 || !s.is_finite() { 1.0 } else { s },
            })
            .collect();

        Ok(Self { params })
    }

    pub fn n_features(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    /// Scale a single row
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        if row.len() != self.params.len() {
            return Err(SurvivalError::ShapeError {
                expected: format!("{} features", self.params.len()),
                actual: format!("{} features", row.len()),
            });
        }

        Ok(row
            .iter()
            .zip(&self.params)
            .map(|(&v, p)| (v - p.center) / p.scale)
            .collect())
    }

    /// Scale every row of a matrix
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut out = Array2::zeros(x.raw_dim());
        for (i, row) in x.rows().into_iter().enumerate() {
            out.row_mut(i).assign(&self.transform_row(row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();

        assert_eq!(scaler.params()[0], ScalerParams { center: 2.0, scale: 1.0 });
        // Constant column keeps unit scale
        assert_eq!(scaler.params()[1].scale, 1.0);

        let scaled = scaler.transform(&x).unwrap();
        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_row_matches_matrix() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 0.5, -1.0], [2.5, 9.0, 0.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        for (i, row) in x.rows().into_iter().enumerate() {
            assert_eq!(scaler.transform_row(row).unwrap(), scaled.row(i));
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform_row(array![1.0].view()),
            Err(SurvivalError::ShapeError { .. })
        ));
    }
}
