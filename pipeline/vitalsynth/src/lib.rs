//! Offline synthesis of joint glucose / heart-rate / step-count cohorts.
//!
//! Given a small real cohort with all three signals and a larger set of
//! synthetic glucose-only series, [`pipeline::run`] produces a synthetic
//! dataset where every glucose user also has plausible heart-rate and step
//! series on the same 5-minute grid.
//!
//! ```ignore
//! use vitalsynth::{run_files, PipelineConfig};
//! let cfg = PipelineConfig::default().with_seed(Some(42));
//! let report = run_files(
//!     &cfg,
//!     "real/prepr_real.csv".as_ref(),
//!     "synthetic/prepr_synt.csv".as_ref(),
//!     "synthetic/enhanced.csv".as_ref(),
//! )?;
//! println!("{} rows", report.output_rows);
//! ```
pub mod config;
pub mod cross_signal;
pub mod density;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod materialize;
pub mod pipeline;

pub use config::{PipelineConfig, TemplateStrategy};
pub use cross_signal::{assign_hr_steps, ClusterTemplate, CrossSignalOutcome};
pub use density::{generate_synthetic_features, ClusterAssignment, SyntheticFeatures};
pub use ensemble::{blend, predict_hr_steps, train_models, Ensemble, SyntheticUserProfile};
pub use error::PipelineError;
pub use features::{
    extract_glucose_features, extract_hr_steps_features, extract_synthetic_glucose_features,
    join_features, FeatureTable, FeatureVector, GlucoseFeatures, HrStepsFeatures,
};
pub use materialize::{generate_time_series, round_and_clip};
pub use pipeline::{run, run_files, PipelineRun, SynthesisReport};
