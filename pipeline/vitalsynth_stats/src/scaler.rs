use crate::error::{check_matrix, StatsError};
use crate::{column_means, column_stds};

/// Per-dimension standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. A dimension with zero spread maps
/// every value to 0 and inverts back to the column mean.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, StatsError> {
        let mean = column_means(rows)?;
        let std = column_stds(rows)?;
        Ok(Self { mean, std })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Indices of dimensions with zero spread.
    pub fn degenerate_dims(&self) -> Vec<usize> {
        self.std
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, StatsError> {
        self.check_dim(row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&m, &s))| if s == 0.0 { 0.0 } else { (x - m) / s })
            .collect())
    }

    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>, StatsError> {
        self.check_dim(row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&z, (&m, &s))| if s == 0.0 { m } else { z * s + m })
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StatsError> {
        check_matrix(rows, "transform")?;
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn inverse_transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StatsError> {
        check_matrix(rows, "inverse_transform")?;
        rows.iter().map(|r| self.inverse_transform_row(r)).collect()
    }

    fn check_dim(&self, row: &[f64]) -> Result<(), StatsError> {
        if row.len() != self.dim() {
            return Err(StatsError::DimensionMismatch {
                expected: self.dim(),
                found: row.len(),
            });
        }
        Ok(())
    }
}
