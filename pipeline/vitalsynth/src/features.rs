//! Per-user summary features.
//!
//! Real cohort: glucose and hr/steps summaries per user; a user whose summary
//! has any undefined value is dropped (and listed in `dropped`). Synthetic
//! glucose matrix: one summary per row, with an undefined skew mapped to 0 and
//! nothing dropped.

use serde::Serialize;
use vitalsynth_data::{GlucoseMatrix, RawSeries, UserId};
use vitalsynth_stats::{max, mean, median, min, skewness, stddev_sample, Moments};

use crate::error::{PipelineError, Result};

/// Fixed-width feature record convertible to and from a plain vector.
pub trait FeatureVector: Sized + Copy {
    const NAMES: &'static [&'static str];

    fn to_vec(&self) -> Vec<f64>;

    fn from_slice(values: &[f64]) -> Result<Self>;

    fn is_defined(&self) -> bool {
        self.to_vec().iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlucoseFeatures {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub skew: f64,
}

impl GlucoseFeatures {
    /// Summary of one series; undefined statistics come back as NaN.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std: stddev_sample(values),
            min: min(values),
            max: max(values),
            median: median(values.to_vec()),
            skew: skewness(values),
        }
    }
}

impl FeatureVector for GlucoseFeatures {
    const NAMES: &'static [&'static str] = &["mean", "std", "min", "max", "median", "skew"];

    fn to_vec(&self) -> Vec<f64> {
        vec![self.mean, self.std, self.min, self.max, self.median, self.skew]
    }

    fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            &[mean, std, min, max, median, skew] => Ok(Self {
                mean,
                std,
                min,
                max,
                median,
                skew,
            }),
            _ => Err(width_error(Self::NAMES.len(), values.len())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HrStepsFeatures {
    pub hr_mean: f64,
    pub hr_std: f64,
    pub steps_mean: f64,
    pub steps_std: f64,
}

impl HrStepsFeatures {
    pub fn from_series(series: &RawSeries) -> Self {
        let hr: Moments = series.heart_rate().collect();
        let steps: Moments = series.steps().collect();
        Self {
            hr_mean: hr.mean(),
            hr_std: hr.stddev_sample(),
            steps_mean: steps.mean(),
            steps_std: steps.stddev_sample(),
        }
    }
}

impl FeatureVector for HrStepsFeatures {
    const NAMES: &'static [&'static str] = &["hr_mean", "hr_std", "steps_mean", "steps_std"];

    fn to_vec(&self) -> Vec<f64> {
        vec![self.hr_mean, self.hr_std, self.steps_mean, self.steps_std]
    }

    fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            &[hr_mean, hr_std, steps_mean, steps_std] => Ok(Self {
                hr_mean,
                hr_std,
                steps_mean,
                steps_std,
            }),
            _ => Err(width_error(Self::NAMES.len(), values.len())),
        }
    }
}

fn width_error(expected: usize, found: usize) -> PipelineError {
    PipelineError::ShapeMismatch(format!(
        "feature vector has {found} values, expected {expected}"
    ))
}

/// Feature rows keyed by user id, in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable<F> {
    pub user_ids: Vec<UserId>,
    pub rows: Vec<F>,
    /// Users removed because a feature was undefined.
    pub dropped: Vec<UserId>,
}

impl<F> FeatureTable<F> {
    fn new() -> Self {
        Self {
            user_ids: Vec::new(),
            rows: Vec::new(),
            dropped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, user_id: UserId) -> Option<&F> {
        self.user_ids
            .binary_search(&user_id)
            .ok()
            .map(|i| &self.rows[i])
    }
}

impl<F: FeatureVector> FeatureTable<F> {
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(FeatureVector::to_vec).collect()
    }

    fn collect_defined(pairs: impl Iterator<Item = (UserId, F)>, what: &str) -> Self {
        let mut table = Self::new();
        for (user_id, f) in pairs {
            if f.is_defined() {
                table.user_ids.push(user_id);
                table.rows.push(f);
            } else {
                log::warn!("dropping user {user_id}: undefined {what} features");
                table.dropped.push(user_id);
            }
        }
        table
    }
}

/// Glucose summaries of the real cohort. Missing glucose cells are ignored;
/// users with fewer than three readings have no skew and are dropped.
pub fn extract_glucose_features(cohort: &[RawSeries]) -> FeatureTable<GlucoseFeatures> {
    let mut series: Vec<&RawSeries> = cohort.iter().collect();
    series.sort_by_key(|s| s.user_id);
    let table = FeatureTable::collect_defined(
        series.into_iter().map(|s| {
            let values: Vec<f64> = s.glucose().collect();
            (s.user_id, GlucoseFeatures::from_values(&values))
        }),
        "glucose",
    );
    log::debug!(
        "glucose features: {} users kept, {} dropped",
        table.len(),
        table.dropped.len()
    );
    table
}

/// Glucose summaries of every synthetic user, keyed by matrix row index.
pub fn extract_synthetic_glucose_features(
    matrix: &GlucoseMatrix,
) -> Result<FeatureTable<GlucoseFeatures>> {
    if matrix.rows.is_empty() {
        return Err(PipelineError::InsufficientCohort(
            "synthetic glucose matrix has no users".into(),
        ));
    }
    let mut table = FeatureTable::new();
    for (idx, row) in matrix.rows.iter().enumerate() {
        let user_id = idx as UserId;
        let mut f = GlucoseFeatures::from_values(row);
        if f.skew.is_nan() {
            f.skew = 0.0;
        }
        if !f.is_defined() {
            return Err(PipelineError::ShapeMismatch(format!(
                "synthetic user {user_id} has {} glucose values; at least 2 are needed",
                row.len()
            )));
        }
        table.user_ids.push(user_id);
        table.rows.push(f);
    }
    Ok(table)
}

/// Heart-rate and step summaries of the real cohort. A user with fewer than
/// two readings of either signal is dropped.
pub fn extract_hr_steps_features(cohort: &[RawSeries]) -> FeatureTable<HrStepsFeatures> {
    let mut series: Vec<&RawSeries> = cohort.iter().collect();
    series.sort_by_key(|s| s.user_id);
    let table = FeatureTable::collect_defined(
        series
            .into_iter()
            .map(|s| (s.user_id, HrStepsFeatures::from_series(s))),
        "hr/steps",
    );
    log::debug!(
        "hr/steps features: {} users kept, {} dropped",
        table.len(),
        table.dropped.len()
    );
    table
}

/// Users present in both tables, as aligned `(glucose, hr/steps)` pairs.
pub fn join_features(
    glucose: &FeatureTable<GlucoseFeatures>,
    hr_steps: &FeatureTable<HrStepsFeatures>,
) -> FeatureTable<(GlucoseFeatures, HrStepsFeatures)> {
    let mut joined = FeatureTable::new();
    for (user_id, g) in glucose.user_ids.iter().zip(&glucose.rows) {
        match hr_steps.get(*user_id) {
            Some(h) => {
                joined.user_ids.push(*user_id);
                joined.rows.push((*g, *h));
            }
            None => joined.dropped.push(*user_id),
        }
    }
    joined
}
