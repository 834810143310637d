//! Pluggable supervised regression strategy

use rand::rngs::StdRng;

use crate::error::{check_matrix, StatsError};

/// Multi-output regressor: maps feature rows to target rows.
///
/// Implementations are trained once and then used read-only, so `predict`
/// takes `&self`. Any randomness used during training comes from the caller's
/// stream.
pub trait Regressor: Send + Sync {
    fn fit(
        &mut self,
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
        rng: &mut StdRng,
    ) -> Result<(), StatsError>;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, StatsError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Validates a training pair and returns `(n_features, n_targets)`.
pub fn check_training_set(
    features: &[Vec<f64>],
    targets: &[Vec<f64>],
) -> Result<(usize, usize), StatsError> {
    let d = check_matrix(features, "training features")?;
    let t = check_matrix(targets, "training targets")?;
    if features.len() != targets.len() {
        return Err(StatsError::RowCountMismatch {
            features: features.len(),
            targets: targets.len(),
        });
    }
    Ok((d, t))
}
