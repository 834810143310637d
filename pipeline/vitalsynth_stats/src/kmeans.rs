//! Lloyd's k-means with k-means++ seeding and best-of-n restarts

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{check_matrix, StatsError};
use crate::{fork_rng, squared_euclidean};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on the total squared centroid shift.
    pub tol: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
        }
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    /// Sum of squared distances of samples to their centroid.
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeansFit {
    /// Number of samples assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

impl KMeans {
    pub fn fit(&self, rows: &[Vec<f64>], rng: &mut StdRng) -> Result<KMeansFit, StatsError> {
        if self.k == 0 {
            return Err(StatsError::InvalidParameter {
                name: "k",
                reason: "must be at least 1".into(),
            });
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(StatsError::InvalidParameter {
                name: "n_init/max_iter",
                reason: "must be at least 1".into(),
            });
        }
        check_matrix(rows, "kmeans samples")?;
        if rows.len() < self.k {
            return Err(StatsError::TooFewSamples {
                n: rows.len(),
                k: self.k,
            });
        }

        let mut best: Option<KMeansFit> = None;
        for run in 0..self.n_init {
            let mut run_rng = fork_rng(rng);
            let fit = self.single_run(rows, &mut run_rng);
            log::trace!("k-means run {run}: inertia {:.6} after {} iterations", fit.inertia, fit.n_iter);
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        let best = best.ok_or(StatsError::EmptyInput("kmeans runs"))?;
        log::debug!(
            "k-means k={} on {} samples: inertia {:.4}, sizes {:?}",
            self.k,
            rows.len(),
            best.inertia,
            best.cluster_sizes()
        );
        Ok(best)
    }

    pub fn fit_predict(&self, rows: &[Vec<f64>], rng: &mut StdRng) -> Result<Vec<usize>, StatsError> {
        Ok(self.fit(rows, rng)?.labels)
    }

    fn single_run(&self, rows: &[Vec<f64>], rng: &mut StdRng) -> KMeansFit {
        let mut centroids = init_plus_plus(rows, self.k, rng);
        let mut labels = vec![0usize; rows.len()];
        let mut n_iter = 0;

        loop {
            n_iter += 1;
            for (i, row) in rows.iter().enumerate() {
                labels[i] = nearest_centroid(row, &centroids).0;
            }
            let updated = recompute_centroids(rows, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_euclidean(a, b))
                .sum();
            centroids = updated;
            if shift <= self.tol || n_iter >= self.max_iter {
                break;
            }
        }

        let mut inertia = 0.0;
        for (i, row) in rows.iter().enumerate() {
            let (l, d) = nearest_centroid(row, &centroids);
            labels[i] = l;
            inertia += d;
        }
        KMeansFit {
            centroids,
            labels,
            inertia,
            n_iter,
        }
    }
}

fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(row, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// k-means++: the first centre is uniform, each further centre is drawn with
/// probability proportional to its squared distance from the closest chosen one.
fn init_plus_plus(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(rows[rng.gen_range(0..rows.len())].clone());
    let mut dist: Vec<f64> = rows
        .iter()
        .map(|r| squared_euclidean(r, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = dist.iter().sum();
        let idx = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = rows.len() - 1;
            for (i, &d) in dist.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // all remaining points coincide with a centre
            rng.gen_range(0..rows.len())
        };
        let c = rows[idx].clone();
        for (d, r) in dist.iter_mut().zip(rows) {
            *d = d.min(squared_euclidean(r, &c));
        }
        centroids.push(c);
    }
    centroids
}

/// Mean of each cluster's members. A cluster left empty is re-seeded at the
/// sample farthest from its current centroid.
fn recompute_centroids(rows: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dim = rows[0].len();
    let k = previous.len();
    let mut sums = vec![vec![0.0; dim]; k];
    let mut counts = vec![0usize; k];
    for (row, &l) in rows.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(row) {
            *s += v;
        }
    }

    let mut out = Vec::with_capacity(k);
    for (c, (sum, &count)) in sums.into_iter().zip(&counts).enumerate() {
        if count > 0 {
            out.push(sum.into_iter().map(|s| s / count as f64).collect());
        } else {
            let far = rows
                .iter()
                .zip(labels)
                .map(|(r, &l)| squared_euclidean(r, &previous[l]))
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            log::trace!("k-means cluster {c} emptied; re-seeding at sample {far}");
            out.push(rows[far].clone());
        }
    }
    out
}
