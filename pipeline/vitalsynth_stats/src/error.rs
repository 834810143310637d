use thiserror::Error;

/// Errors raised by the numerical primitives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Row count mismatch: {features} feature rows vs {targets} target rows")]
    RowCountMismatch { features: usize, targets: usize },
    #[error("Cannot form {k} clusters from {n} samples")]
    TooFewSamples { n: usize, k: usize },
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Non-finite value at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },
    #[error("Model has not been fitted")]
    NotFitted,
}

/// Checks that `rows` is non-empty, rectangular and finite. Returns the column count.
pub fn check_matrix(rows: &[Vec<f64>], what: &'static str) -> Result<usize, StatsError> {
    let first = rows.first().ok_or(StatsError::EmptyInput(what))?;
    let dim = first.len();
    if dim == 0 {
        return Err(StatsError::EmptyInput(what));
    }
    for (r, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(StatsError::DimensionMismatch {
                expected: dim,
                found: row.len(),
            });
        }
        if let Some(c) = row.iter().position(|v| !v.is_finite()) {
            return Err(StatsError::NonFinite { row: r, col: c });
        }
    }
    Ok(dim)
}
