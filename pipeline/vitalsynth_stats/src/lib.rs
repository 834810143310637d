//! Numerical building blocks for synthetic cohort generation.
//!
//! The crate covers four families of primitives:
//! - descriptive statistics over a single signal (`mean`, `median`,
//!   `stddev_sample`, `skewness`) and the streaming [`Moments`] accumulator
//! - per-dimension standardization ([`StandardScaler`])
//! - density estimation and clustering ([`KernelDensity`], [`KMeans`])
//! - supervised regression behind the [`Regressor`] strategy trait
//!   ([`RandomForestRegressor`])
//!
//! Every stochastic routine takes an explicit `&mut StdRng`; nothing in this
//! crate touches global random state.
//!
//! ```
//! use vitalsynth_stats::{seeded_rng, KernelDensity, StandardScaler};
//! let rows = vec![vec![1.0, 10.0], vec![2.0, 12.0], vec![3.0, 11.0]];
//! let scaler = StandardScaler::fit(&rows).unwrap();
//! let z = scaler.transform(&rows).unwrap();
//! let kde = KernelDensity::fit(&z, 0.5).unwrap();
//! let mut rng = seeded_rng(Some(42));
//! let samples = kde.sample(4, &mut rng);
//! assert_eq!(samples.len(), 4);
//! ```
mod distance;
mod error;
mod forest;
mod kde;
mod kmeans;
mod regressor;
mod rng;
mod scaler;
mod stable;

pub use distance::*;
pub use error::*;
pub use forest::*;
pub use kde::*;
pub use kmeans::*;
pub use regressor::*;
pub use rng::*;
pub use scaler::*;
pub use stable::*;

/// Second central moments below this are treated as exact zero.
const ZERO_VARIANCE_EPS: f64 = 1e-14;

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

pub fn median(mut xs: Vec<f64>) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let n = xs.len();
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    }
}

/// Unbiased sample standard deviation (n-1 denominator)
pub fn stddev_sample(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / ((n as f64) - 1.0);
    var.sqrt()
}

/// Adjusted Fisher-Pearson sample skewness.
///
/// Undefined (NaN) for fewer than three values. A series with no spread has
/// skew 0.
pub fn skewness(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 3 {
        return f64::NAN;
    }
    let m = mean(xs);
    let nf = n as f64;
    let (mut m2, mut m3) = (0.0, 0.0);
    for &x in xs {
        let d = x - m;
        m2 += d * d;
        m3 += d * d * d;
    }
    m2 /= nf;
    m3 /= nf;
    if m2 < ZERO_VARIANCE_EPS {
        return 0.0;
    }
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * (m3 / m2.powf(1.5))
}

pub fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

pub fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

/// Column-wise mean of a non-empty rectangular matrix.
pub fn column_means(rows: &[Vec<f64>]) -> Result<Vec<f64>, StatsError> {
    let dim = check_matrix(rows, "column_means")?;
    let mut acc = vec![0.0; dim];
    for row in rows {
        for (a, v) in acc.iter_mut().zip(row) {
            *a += v;
        }
    }
    let n = rows.len() as f64;
    Ok(acc.into_iter().map(|a| a / n).collect())
}

/// Column-wise population standard deviation (n denominator).
pub fn column_stds(rows: &[Vec<f64>]) -> Result<Vec<f64>, StatsError> {
    let means = column_means(rows)?;
    let n = rows.len() as f64;
    let mut acc = vec![0.0; means.len()];
    for row in rows {
        for ((a, v), m) in acc.iter_mut().zip(row).zip(&means) {
            *a += (v - m) * (v - m);
        }
    }
    Ok(acc.into_iter().map(|a| (a / n).sqrt()).collect())
}
