//! Gaussian kernel density estimate with a fixed isotropic bandwidth

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{check_matrix, StatsError};
use crate::squared_euclidean;

#[derive(Debug, Clone, PartialEq)]
pub struct KernelDensity {
    points: Vec<Vec<f64>>,
    bandwidth: f64,
    dim: usize,
}

impl KernelDensity {
    /// Stores the training points. The kernel is N(0, bandwidth^2 I) centred on
    /// each of them.
    pub fn fit(points: &[Vec<f64>], bandwidth: f64) -> Result<Self, StatsError> {
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(StatsError::InvalidParameter {
                name: "bandwidth",
                reason: format!("must be finite and positive, got {bandwidth}"),
            });
        }
        let dim = check_matrix(points, "kde points")?;
        log::debug!(
            "KDE fitted on {} points in {} dimensions (bandwidth {})",
            points.len(),
            dim,
            bandwidth
        );
        Ok(Self {
            points: points.to_vec(),
            bandwidth,
            dim,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Draws `n` vectors: pick a training point uniformly, then add isotropic
    /// Gaussian noise with the kernel bandwidth.
    pub fn sample(&self, n: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        (0..n)
            .map(|_| {
                let centre = &self.points[rng.gen_range(0..self.points.len())];
                centre
                    .iter()
                    .map(|&c| {
                        let z: f64 = StandardNormal.sample(rng);
                        c + self.bandwidth * z
                    })
                    .collect()
            })
            .collect()
    }

    /// Log density at each query row.
    pub fn score_samples(&self, queries: &[Vec<f64>]) -> Result<Vec<f64>, StatsError> {
        let h2 = self.bandwidth * self.bandwidth;
        let log_norm = (self.points.len() as f64).ln()
            + 0.5 * self.dim as f64 * (2.0 * std::f64::consts::PI * h2).ln();
        queries
            .iter()
            .map(|q| {
                if q.len() != self.dim {
                    return Err(StatsError::DimensionMismatch {
                        expected: self.dim,
                        found: q.len(),
                    });
                }
                let exps: Vec<f64> = self
                    .points
                    .iter()
                    .map(|p| -0.5 * squared_euclidean(q, p) / h2)
                    .collect();
                Ok(log_sum_exp(&exps) - log_norm)
            })
            .collect()
    }
}

fn log_sum_exp(xs: &[f64]) -> f64 {
    let m = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if m == f64::NEG_INFINITY {
        return m;
    }
    m + xs.iter().map(|x| (x - m).exp()).sum::<f64>().ln()
}
