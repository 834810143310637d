use std::path::PathBuf;

use thiserror::Error;
use vitalsynth_data::{DataError, UserId};
use vitalsynth_stats::StatsError;

/// Any failure aborts the whole run; nothing is written on error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Numerical error: {0}")]
    Stats(#[from] StatsError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Cannot read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Insufficient cohort: {0}")]
    InsufficientCohort(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Non-finite {field} for synthetic user {user_id}")]
    NonFiniteProfile { user_id: UserId, field: &'static str },
    #[error("Cannot write run report: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
