//! Ensemble predictor: glucose features -> hr/steps features.
//!
//! One regressor learns the mapping on the real cohort, another on the
//! synthetic pairs from the cross-signal stage. Predictions are blended with
//! fixed weights.

use rand::rngs::StdRng;
use serde::Serialize;
use vitalsynth_data::UserId;
use vitalsynth_stats::{fork_rng, RandomForestRegressor, Regressor};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::{FeatureTable, FeatureVector, GlucoseFeatures, HrStepsFeatures};

/// Glucose features of one synthetic user with predicted hr/steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyntheticUserProfile {
    pub user_id: UserId,
    pub glucose: GlucoseFeatures,
    pub hr_steps: HrStepsFeatures,
}

/// Weighted sum of two predictions, element by element.
pub fn blend(real: &[f64], synthetic: &[f64], real_weight: f64, synth_weight: f64) -> Vec<f64> {
    real.iter()
        .zip(synthetic)
        .map(|(&a, &b)| real_weight * a + synth_weight * b)
        .collect()
}

pub struct Ensemble<R: Regressor = RandomForestRegressor> {
    real: R,
    synthetic: R,
    real_weight: f64,
    synth_weight: f64,
}

impl Ensemble<RandomForestRegressor> {
    pub fn random_forests(cfg: &PipelineConfig) -> Self {
        Self::new(
            RandomForestRegressor::new(cfg.n_estimators),
            RandomForestRegressor::new(cfg.n_estimators),
            cfg.real_weight,
            cfg.synth_weight,
        )
    }
}

impl<R: Regressor> Ensemble<R> {
    pub fn new(real: R, synthetic: R, real_weight: f64, synth_weight: f64) -> Self {
        Self {
            real,
            synthetic,
            real_weight,
            synth_weight,
        }
    }

    /// Trains both models. Each gets its own stream forked from `rng`.
    pub fn train(
        &mut self,
        real: &FeatureTable<(GlucoseFeatures, HrStepsFeatures)>,
        synthetic_glucose: &[GlucoseFeatures],
        synthetic_hr_steps: &[HrStepsFeatures],
        rng: &mut StdRng,
    ) -> Result<()> {
        if real.is_empty() {
            return Err(PipelineError::InsufficientCohort(
                "no real user has both glucose and hr/steps features to train on".into(),
            ));
        }
        if synthetic_glucose.len() != synthetic_hr_steps.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} synthetic feature rows but {} hr/steps rows",
                synthetic_glucose.len(),
                synthetic_hr_steps.len()
            )));
        }
        let x_real: Vec<Vec<f64>> = real.rows.iter().map(|(g, _)| g.to_vec()).collect();
        let y_real: Vec<Vec<f64>> = real.rows.iter().map(|(_, h)| h.to_vec()).collect();
        let x_synth: Vec<Vec<f64>> = synthetic_glucose.iter().map(FeatureVector::to_vec).collect();
        let y_synth: Vec<Vec<f64>> = synthetic_hr_steps.iter().map(FeatureVector::to_vec).collect();

        let mut real_rng = fork_rng(rng);
        let mut synth_rng = fork_rng(rng);
        self.real.fit(&x_real, &y_real, &mut real_rng)?;
        self.synthetic.fit(&x_synth, &y_synth, &mut synth_rng)?;
        log::info!(
            "ensemble trained: {} on {} real rows, {} on {} synthetic rows",
            self.real.name(),
            x_real.len(),
            self.synthetic.name(),
            x_synth.len()
        );
        Ok(())
    }

    /// Blended hr/steps prediction for every row of `glucose`.
    pub fn predict(
        &self,
        glucose: &FeatureTable<GlucoseFeatures>,
    ) -> Result<Vec<SyntheticUserProfile>> {
        let x = glucose.matrix();
        let from_real = self.real.predict(&x)?;
        let from_synth = self.synthetic.predict(&x)?;
        glucose
            .user_ids
            .iter()
            .zip(&glucose.rows)
            .zip(from_real.iter().zip(&from_synth))
            .map(|((&user_id, g), (a, b))| {
                Ok(SyntheticUserProfile {
                    user_id,
                    glucose: *g,
                    hr_steps: HrStepsFeatures::from_slice(&blend(
                        a,
                        b,
                        self.real_weight,
                        self.synth_weight,
                    ))?,
                })
            })
            .collect()
    }
}

/// Trains the random-forest pair described by `cfg`.
pub fn train_models(
    real: &FeatureTable<(GlucoseFeatures, HrStepsFeatures)>,
    synthetic_glucose: &[GlucoseFeatures],
    synthetic_hr_steps: &[HrStepsFeatures],
    cfg: &PipelineConfig,
    rng: &mut StdRng,
) -> Result<Ensemble> {
    let mut ensemble = Ensemble::random_forests(cfg);
    ensemble.train(real, synthetic_glucose, synthetic_hr_steps, rng)?;
    Ok(ensemble)
}

pub fn predict_hr_steps<R: Regressor>(
    ensemble: &Ensemble<R>,
    glucose: &FeatureTable<GlucoseFeatures>,
) -> Result<Vec<SyntheticUserProfile>> {
    ensemble.predict(glucose)
}
