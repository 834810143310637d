//! Materialises per-user profiles into the 5-minute long-format dataset.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use vitalsynth_data::{GlucoseMatrix, SyntheticRow, UserId};

use crate::config::PipelineConfig;
use crate::ensemble::SyntheticUserProfile;
use crate::error::{PipelineError, Result};

/// Rounds half to even, then clamps into `[lo, hi]`.
pub fn round_and_clip(value: f64, [lo, hi]: [i64; 2]) -> i64 {
    (value.round_ties_even() as i64).clamp(lo, hi)
}

/// Expands every profile into one row per time slot of its glucose row.
///
/// Heart rate and steps are drawn independently per slot from
/// `Normal(mean, std)` (a negative std is treated as 0), rounded, and clipped
/// to the configured ranges. Glucose is copied unchanged. Row order is user,
/// then time.
pub fn generate_time_series(
    profiles: &[SyntheticUserProfile],
    glucose: &GlucoseMatrix,
    cfg: &PipelineConfig,
    rng: &mut StdRng,
) -> Result<Vec<SyntheticRow>> {
    if profiles.len() != glucose.n_users() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} profiles for {} glucose rows",
            profiles.len(),
            glucose.n_users()
        )));
    }
    let slots = glucose.n_timepoints();
    if slots != cfg.slots_per_day {
        return Err(PipelineError::ShapeMismatch(format!(
            "glucose matrix has {slots} time points, expected {}",
            cfg.slots_per_day
        )));
    }
    let times: Vec<_> = (0..slots as i32)
        .map(|i| cfg.anchor + cfg.cadence() * i)
        .collect();

    let mut rows = Vec::with_capacity(profiles.len() * slots);
    for profile in profiles {
        let user_id = profile.user_id;
        let glucose_row = glucose.rows.get(user_id as usize).ok_or_else(|| {
            PipelineError::ShapeMismatch(format!("no glucose row for synthetic user {user_id}"))
        })?;
        let hs = &profile.hr_steps;
        let hr = draw(hs.hr_mean, hs.hr_std, slots, user_id, "heart-rate profile", rng)?;
        let steps = draw(hs.steps_mean, hs.steps_std, slots, user_id, "steps profile", rng)?;
        for (i, time) in times.iter().enumerate() {
            rows.push(SyntheticRow {
                user_id,
                time: *time,
                glucose: glucose_row[i],
                heart_rate: round_and_clip(hr[i], cfg.heart_rate_range),
                steps: round_and_clip(steps[i], cfg.steps_range),
            });
        }
    }
    log::info!("materialised {} rows for {} users", rows.len(), profiles.len());
    Ok(rows)
}

fn draw(
    mean: f64,
    std: f64,
    n: usize,
    user_id: UserId,
    field: &'static str,
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    if !mean.is_finite() || !std.is_finite() {
        return Err(PipelineError::NonFiniteProfile { user_id, field });
    }
    let sd = std.max(0.0);
    Ok((0..n)
        .map(|_| mean + sd * rng.sample::<f64, _>(StandardNormal))
        .collect())
}
