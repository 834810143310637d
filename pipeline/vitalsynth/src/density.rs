//! Density and cluster model over the real glucose feature space.
//!
//! Real features are standardised, a Gaussian KDE is fitted in that space and
//! sampled, samples are mapped back to original units, and k-means partitions
//! the standardised samples.

use rand::rngs::StdRng;
use vitalsynth_stats::{KMeans, KernelDensity, StandardScaler};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::{FeatureTable, FeatureVector, GlucoseFeatures};

/// Cluster label per synthetic sample, labels in `0..k`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    k: usize,
}

impl ClusterAssignment {
    pub fn new(labels: Vec<usize>, k: usize) -> Result<Self> {
        if let Some(&bad) = labels.iter().find(|&&l| l >= k) {
            return Err(PipelineError::ShapeMismatch(format!(
                "cluster label {bad} outside 0..{k}"
            )));
        }
        Ok(Self { labels, k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Sample indices of cluster `c`, ascending.
    pub fn members(&self, c: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == c)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

/// Output of the density stage.
#[derive(Debug, Clone)]
pub struct SyntheticFeatures {
    /// Samples in original units.
    pub features: Vec<GlucoseFeatures>,
    /// The same samples in the scaler's standardised space.
    pub standardized: Vec<Vec<f64>>,
    pub clusters: ClusterAssignment,
    /// Fitted on the real glucose features.
    pub scaler: StandardScaler,
    /// Features constant across the real cohort. Every sample carries the
    /// cohort value for them.
    pub degenerate_features: Vec<&'static str>,
}

impl SyntheticFeatures {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.features.iter().map(FeatureVector::to_vec).collect()
    }
}

/// Samples `cfg.n_samples` synthetic glucose feature vectors and clusters them.
///
/// Fails when the cohort has fewer than `cfg.min_real_users` users. A feature
/// with zero spread across the cohort standardises to 0 and maps back to its
/// cohort value.
pub fn generate_synthetic_features(
    real: &FeatureTable<GlucoseFeatures>,
    cfg: &PipelineConfig,
    rng: &mut StdRng,
) -> Result<SyntheticFeatures> {
    if real.len() < cfg.min_real_users {
        return Err(PipelineError::InsufficientCohort(format!(
            "{} real users with valid glucose features, need at least {}",
            real.len(),
            cfg.min_real_users
        )));
    }
    let matrix = real.matrix();
    let scaler = StandardScaler::fit(&matrix)?;
    let degenerate_features: Vec<&'static str> = scaler
        .degenerate_dims()
        .into_iter()
        .map(|dim| GlucoseFeatures::NAMES[dim])
        .collect();
    for name in &degenerate_features {
        log::warn!("glucose feature '{name}' is constant across the real cohort");
    }
    let scaled = scaler.transform(&matrix)?;

    let kde = KernelDensity::fit(&scaled, cfg.bandwidth)?;
    let standardized = kde.sample(cfg.n_samples, rng);
    let features = scaler
        .inverse_transform(&standardized)?
        .iter()
        .map(|row| GlucoseFeatures::from_slice(row))
        .collect::<Result<Vec<_>>>()?;

    let fit = KMeans::new(cfg.n_clusters)
        .with_n_init(cfg.kmeans_n_init)
        .with_max_iter(cfg.kmeans_max_iter)
        .fit(&standardized, rng)?;
    log::debug!(
        "k-means: inertia {:.4} after {} iterations, sizes {:?}",
        fit.inertia,
        fit.n_iter,
        fit.cluster_sizes()
    );
    let clusters = ClusterAssignment::new(fit.labels, cfg.n_clusters)?;
    log::info!(
        "density stage: {} samples from {} real users in {} clusters",
        features.len(),
        real.len(),
        clusters.k()
    );

    Ok(SyntheticFeatures {
        features,
        standardized,
        clusters,
        scaler,
        degenerate_features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vitalsynth_stats::seeded_rng;

    fn table(rows: &[[f64; 6]]) -> FeatureTable<GlucoseFeatures> {
        FeatureTable {
            user_ids: (0..rows.len() as u32).collect(),
            rows: rows
                .iter()
                .map(|r| GlucoseFeatures::from_slice(r).unwrap())
                .collect(),
            dropped: Vec::new(),
        }
    }

    fn cohort() -> FeatureTable<GlucoseFeatures> {
        table(&[
            [110.0, 20.0, 70.0, 180.0, 105.0, 0.8],
            [125.0, 28.0, 65.0, 220.0, 118.0, 1.1],
            [98.0, 15.0, 72.0, 160.0, 96.0, 0.4],
            [140.0, 35.0, 60.0, 260.0, 130.0, 1.5],
        ])
    }

    #[test]
    fn produces_requested_samples_and_clusters() {
        let cfg = PipelineConfig::default();
        let out = generate_synthetic_features(&cohort(), &cfg, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!(out.len(), 100);
        assert_eq!(out.standardized.len(), 100);
        assert_eq!(out.clusters.labels().len(), 100);
        assert_eq!(out.clusters.sizes().iter().sum::<usize>(), 100);
        assert!(out.clusters.labels().iter().all(|&l| l < 5));
        assert!(out.features.iter().all(|f| f.is_defined()));
    }

    #[test]
    fn samples_map_back_through_scaler() {
        let cfg = PipelineConfig {
            n_samples: 10,
            n_clusters: 2,
            ..PipelineConfig::default()
        };
        let out = generate_synthetic_features(&cohort(), &cfg, &mut seeded_rng(Some(5))).unwrap();
        for (f, z) in out.features.iter().zip(&out.standardized) {
            let back = out.scaler.transform_row(&f.to_vec()).unwrap();
            for (a, b) in back.iter().zip(z) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn same_seed_same_samples() {
        let cfg = PipelineConfig::default();
        let a = generate_synthetic_features(&cohort(), &cfg, &mut seeded_rng(Some(9))).unwrap();
        let b = generate_synthetic_features(&cohort(), &cfg, &mut seeded_rng(Some(9))).unwrap();
        assert_eq!(a.features, b.features);
        assert_eq!(a.clusters, b.clusters);
    }

    #[test]
    fn single_user_cohort_is_insufficient() {
        let cfg = PipelineConfig::default();
        let err = generate_synthetic_features(
            &table(&[[110.0, 20.0, 70.0, 180.0, 105.0, 0.8]]),
            &cfg,
            &mut seeded_rng(Some(1)),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientCohort(_)));
    }

    #[test]
    fn constant_feature_keeps_cohort_value() {
        let cfg = PipelineConfig::default();
        let out = generate_synthetic_features(
            &table(&[
                [110.0, 20.0, 40.0, 180.0, 105.0, 0.8],
                [125.0, 28.0, 40.0, 220.0, 118.0, 1.1],
                [98.0, 15.0, 40.0, 160.0, 96.0, 0.4],
            ]),
            &cfg,
            &mut seeded_rng(Some(1)),
        )
        .unwrap();
        assert_eq!(out.degenerate_features, vec!["min"]);
        assert_eq!(out.len(), 100);
        assert!(out.features.iter().all(|f| f.min == 40.0));
        assert!(out.features.iter().all(|f| f.is_defined()));
    }

    #[test]
    fn spread_cohort_has_no_degenerate_features() {
        let out = generate_synthetic_features(
            &cohort(),
            &PipelineConfig::default(),
            &mut seeded_rng(Some(2)),
        )
        .unwrap();
        assert!(out.degenerate_features.is_empty());
    }

    #[test]
    fn assignment_rejects_out_of_range_labels() {
        assert!(ClusterAssignment::new(vec![0, 3], 3).is_err());
        let a = ClusterAssignment::new(vec![2, 0, 2], 4).unwrap();
        assert_eq!(a.members(2), vec![0, 2]);
        assert_eq!(a.sizes(), vec![1, 0, 2, 0]);
    }
}
