use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// How a cluster's hr/steps template is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStrategy {
    /// Seed every synthetic user from its nearest real user in glucose space,
    /// then take each cluster's centroid in that seeded hr/steps space.
    #[default]
    TwoPass,
    /// Centroids over a zero-initialised accumulator that is only filled in
    /// while iterating clusters. Every centroid is the origin, so each cluster
    /// gets the real user closest to the cohort's mean hr/steps profile.
    Accumulating,
}

/// Run parameters. Every field has a default, so an empty TOML file (or no
/// file at all) gives the standard run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// `None` draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub n_samples: usize,
    pub n_clusters: usize,
    pub bandwidth: f64,
    pub kmeans_n_init: usize,
    pub kmeans_max_iter: usize,
    pub min_real_users: usize,

    pub noise_scale: f64,
    pub template_strategy: TemplateStrategy,

    pub n_estimators: usize,
    pub real_weight: f64,
    pub synth_weight: f64,

    pub slots_per_day: usize,
    pub cadence_minutes: i64,
    pub anchor: NaiveDateTime,
    pub heart_rate_range: [i64; 2],
    pub steps_range: [i64; 2],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            n_samples: 100,
            n_clusters: 5,
            bandwidth: 0.5,
            kmeans_n_init: 10,
            kmeans_max_iter: 300,
            min_real_users: 2,
            noise_scale: 0.1,
            template_strategy: TemplateStrategy::TwoPass,
            n_estimators: 100,
            real_weight: 0.8,
            synth_weight: 0.2,
            slots_per_day: 288,
            cadence_minutes: 5,
            anchor: default_anchor(),
            heart_rate_range: [40, 200],
            steps_range: [0, 500],
        }
    }
}

fn default_anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    pub fn cadence(&self) -> Duration {
        Duration::minutes(self.cadence_minutes)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("n_samples", self.n_samples),
            ("n_clusters", self.n_clusters),
            ("kmeans_n_init", self.kmeans_n_init),
            ("kmeans_max_iter", self.kmeans_max_iter),
            ("n_estimators", self.n_estimators),
            ("slots_per_day", self.slots_per_day),
        ];
        for (name, v) in positive {
            if v == 0 {
                return Err(invalid(format!("{name} must be positive")));
            }
        }
        if self.min_real_users < 2 {
            return Err(invalid("min_real_users must be at least 2".into()));
        }
        if self.n_clusters > self.n_samples {
            return Err(invalid(format!(
                "n_clusters ({}) exceeds n_samples ({})",
                self.n_clusters, self.n_samples
            )));
        }
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(invalid(format!("bandwidth must be positive, got {}", self.bandwidth)));
        }
        if !(self.noise_scale.is_finite() && self.noise_scale >= 0.0) {
            return Err(invalid(format!(
                "noise_scale must be non-negative, got {}",
                self.noise_scale
            )));
        }
        for (name, w) in [("real_weight", self.real_weight), ("synth_weight", self.synth_weight)] {
            if !(0.0..=1.0).contains(&w) {
                return Err(invalid(format!("{name} must lie in [0, 1], got {w}")));
            }
        }
        if (self.real_weight + self.synth_weight - 1.0).abs() > 1e-9 {
            return Err(invalid(format!(
                "real_weight + synth_weight must be 1, got {}",
                self.real_weight + self.synth_weight
            )));
        }
        if self.cadence_minutes <= 0 {
            return Err(invalid("cadence_minutes must be positive".into()));
        }
        for (name, [lo, hi]) in [
            ("heart_rate_range", self.heart_rate_range),
            ("steps_range", self.steps_range),
        ] {
            if lo > hi {
                return Err(invalid(format!("{name} is inverted: [{lo}, {hi}]")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> PipelineError {
    PipelineError::InvalidConfig(msg)
}
