//! Cross-signal synthesis: hr/steps summaries for synthetic glucose samples.
//!
//! Each cluster of synthetic samples is matched to one real user's hr/steps
//! profile (its template). Every member receives that template plus Gaussian
//! noise, all in the standardised hr/steps space, then mapped back to original
//! units.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use vitalsynth_data::UserId;
use vitalsynth_stats::{column_means, column_stds, nearest_index, StandardScaler};

use crate::config::{PipelineConfig, TemplateStrategy};
use crate::density::SyntheticFeatures;
use crate::error::{PipelineError, Result};
use crate::features::{FeatureTable, FeatureVector, GlucoseFeatures, HrStepsFeatures};

/// Real user chosen for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTemplate {
    pub cluster: usize,
    pub size: usize,
    pub real_user: UserId,
    pub profile: HrStepsFeatures,
}

#[derive(Debug, Clone)]
pub struct CrossSignalOutcome {
    /// Aligned with the synthetic samples.
    pub hr_steps: Vec<HrStepsFeatures>,
    pub templates: Vec<ClusterTemplate>,
    /// Clusters with no members; nothing was assigned for them.
    pub empty_clusters: Vec<usize>,
}

/// Assigns an hr/steps profile to every synthetic sample.
///
/// `real_hr_steps` is the template pool. `joined` holds the real users with
/// both glucose and hr/steps features and is only consulted by
/// [`TemplateStrategy::TwoPass`].
pub fn assign_hr_steps(
    synthetic: &SyntheticFeatures,
    real_hr_steps: &FeatureTable<HrStepsFeatures>,
    joined: &FeatureTable<(GlucoseFeatures, HrStepsFeatures)>,
    cfg: &PipelineConfig,
    rng: &mut StdRng,
) -> Result<CrossSignalOutcome> {
    if real_hr_steps.is_empty() {
        return Err(PipelineError::InsufficientCohort(
            "no real user has valid heart-rate and step features".into(),
        ));
    }
    let hr_scaler = StandardScaler::fit(&real_hr_steps.matrix())?;
    let pool = hr_scaler.transform(&real_hr_steps.matrix())?;
    let noise_sd: Vec<f64> = column_stds(&pool)?
        .into_iter()
        .map(|s| s * cfg.noise_scale)
        .collect();

    let seeds = match cfg.template_strategy {
        TemplateStrategy::TwoPass => seed_from_nearest_real(synthetic, joined, &hr_scaler)?,
        TemplateStrategy::Accumulating => {
            vec![vec![0.0; HrStepsFeatures::NAMES.len()]; synthetic.len()]
        }
    };
    let mut assigned = seeds.clone();
    let mut templates = Vec::new();
    let mut empty_clusters = Vec::new();

    for cluster in 0..synthetic.clusters.k() {
        let members = synthetic.clusters.members(cluster);
        if members.is_empty() {
            log::warn!("cluster {cluster} has no members; skipping");
            empty_clusters.push(cluster);
            continue;
        }
        let member_seeds: Vec<Vec<f64>> = members.iter().map(|&m| seeds[m].clone()).collect();
        let centroid = column_means(&member_seeds)?;
        let t = nearest_index(&centroid, &pool)?;
        log::debug!(
            "cluster {cluster}: {} members, template user {}",
            members.len(),
            real_hr_steps.user_ids[t]
        );
        for &m in &members {
            assigned[m] = pool[t]
                .iter()
                .zip(&noise_sd)
                .map(|(&v, &sd)| v + sd * rng.sample::<f64, _>(StandardNormal))
                .collect();
        }
        templates.push(ClusterTemplate {
            cluster,
            size: members.len(),
            real_user: real_hr_steps.user_ids[t],
            profile: real_hr_steps.rows[t],
        });
    }

    let hr_steps = hr_scaler
        .inverse_transform(&assigned)?
        .iter()
        .map(|row| HrStepsFeatures::from_slice(row))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "cross-signal stage: {} samples, {} templates, {} empty clusters",
        hr_steps.len(),
        templates.len(),
        empty_clusters.len()
    );
    Ok(CrossSignalOutcome {
        hr_steps,
        templates,
        empty_clusters,
    })
}

/// Standardised hr/steps of each sample's nearest real user in standardised
/// glucose space.
fn seed_from_nearest_real(
    synthetic: &SyntheticFeatures,
    joined: &FeatureTable<(GlucoseFeatures, HrStepsFeatures)>,
    hr_scaler: &StandardScaler,
) -> Result<Vec<Vec<f64>>> {
    if joined.is_empty() {
        return Err(PipelineError::InsufficientCohort(
            "no real user has both glucose and hr/steps features".into(),
        ));
    }
    let real_glucose: Vec<Vec<f64>> = joined.rows.iter().map(|(g, _)| g.to_vec()).collect();
    let real_glucose = synthetic.scaler.transform(&real_glucose)?;
    let real_hr: Vec<Vec<f64>> = joined.rows.iter().map(|(_, h)| h.to_vec()).collect();
    let real_hr = hr_scaler.transform(&real_hr)?;
    synthetic
        .standardized
        .iter()
        .map(|z| Ok(real_hr[nearest_index(z, &real_glucose)?].clone()))
        .collect()
}
