//! One end-to-end synthesis run.
//!
//! Stages run in a fixed order over a single random stream seeded from the
//! config: features, density/clusters, cross-signal assignment, ensemble
//! training, prediction for the synthetic glucose users, materialisation.

use std::path::Path;

use serde::Serialize;
use vitalsynth_data::{
    read_glucose_matrix, read_real_cohort, write_dataset_atomic, GlucoseMatrix, RawSeries,
    SyntheticRow, UserId,
};
use vitalsynth_stats::seeded_rng;

use crate::config::{PipelineConfig, TemplateStrategy};
use crate::cross_signal::{assign_hr_steps, ClusterTemplate};
use crate::density::generate_synthetic_features;
use crate::ensemble::{predict_hr_steps, train_models};
use crate::error::{PipelineError, Result};
use crate::features::{
    extract_glucose_features, extract_hr_steps_features, extract_synthetic_glucose_features,
    join_features,
};
use crate::materialize::generate_time_series;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisReport {
    pub seed: Option<u64>,
    pub template_strategy: TemplateStrategy,
    pub real_users: usize,
    pub dropped_glucose_users: Vec<UserId>,
    pub dropped_hr_steps_users: Vec<UserId>,
    pub training_users: usize,
    pub synthetic_samples: usize,
    /// Glucose features constant across the real cohort.
    pub degenerate_glucose_features: Vec<String>,
    pub cluster_sizes: Vec<usize>,
    pub empty_clusters: Vec<usize>,
    pub templates: Vec<ClusterTemplate>,
    pub output_users: usize,
    pub output_rows: usize,
}

impl SynthesisReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| PipelineError::Report(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| PipelineError::Report(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub dataset: Vec<SyntheticRow>,
    pub report: SynthesisReport,
}

/// Runs every stage in memory. Nothing touches the filesystem.
pub fn run(
    cfg: &PipelineConfig,
    real: &[RawSeries],
    glucose: &GlucoseMatrix,
) -> Result<PipelineRun> {
    cfg.validate()?;
    if real.is_empty() {
        return Err(PipelineError::InsufficientCohort("real cohort is empty".into()));
    }
    if glucose.n_timepoints() != cfg.slots_per_day {
        return Err(PipelineError::ShapeMismatch(format!(
            "glucose matrix has {} time points, expected {}",
            glucose.n_timepoints(),
            cfg.slots_per_day
        )));
    }
    let mut rng = seeded_rng(cfg.seed);

    let real_glucose = extract_glucose_features(real);
    let real_hr_steps = extract_hr_steps_features(real);
    let joined = join_features(&real_glucose, &real_hr_steps);
    let synthetic_users = extract_synthetic_glucose_features(glucose)?;
    log::info!(
        "features: {} real users ({} with glucose, {} with hr/steps, {} with both), {} synthetic users",
        real.len(),
        real_glucose.len(),
        real_hr_steps.len(),
        joined.len(),
        synthetic_users.len()
    );

    let synthetic = generate_synthetic_features(&real_glucose, cfg, &mut rng)?;
    let cross = assign_hr_steps(&synthetic, &real_hr_steps, &joined, cfg, &mut rng)?;
    let ensemble = train_models(&joined, &synthetic.features, &cross.hr_steps, cfg, &mut rng)?;
    let profiles = predict_hr_steps(&ensemble, &synthetic_users)?;
    let dataset = generate_time_series(&profiles, glucose, cfg, &mut rng)?;

    let report = SynthesisReport {
        seed: cfg.seed,
        template_strategy: cfg.template_strategy,
        real_users: real.len(),
        dropped_glucose_users: real_glucose.dropped.clone(),
        dropped_hr_steps_users: real_hr_steps.dropped.clone(),
        training_users: joined.len(),
        synthetic_samples: synthetic.len(),
        degenerate_glucose_features: synthetic
            .degenerate_features
            .iter()
            .map(|name| name.to_string())
            .collect(),
        cluster_sizes: synthetic.clusters.sizes(),
        empty_clusters: cross.empty_clusters,
        templates: cross.templates,
        output_users: profiles.len(),
        output_rows: dataset.len(),
    };
    Ok(PipelineRun { dataset, report })
}

/// Reads both inputs, runs the pipeline and replaces `out` atomically.
pub fn run_files(
    cfg: &PipelineConfig,
    real_path: &Path,
    glucose_path: &Path,
    out: &Path,
) -> Result<SynthesisReport> {
    let real = read_real_cohort(real_path)?;
    let glucose = read_glucose_matrix(glucose_path)?;
    let PipelineRun { dataset, report } = run(cfg, &real, &glucose)?;
    write_dataset_atomic(out, &dataset)?;
    Ok(report)
}
