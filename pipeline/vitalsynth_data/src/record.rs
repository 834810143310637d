use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::UserId;

/// Output timestamp layout; also the first layout tried when parsing.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: &[&str] = &[
    TIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the timestamp layouts found in exported cohort files. Offsets are
/// dropped and the local wall-clock time is kept.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let v = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(v, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(v).ok().map(|dt| dt.naive_local()))
}

pub fn format_time(t: &NaiveDateTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// One row of the real long-format input as it appears on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    pub user_id: UserId,
    pub time: String,
    pub glucose: Option<f64>,
    pub heart_rate: Option<f64>,
    pub steps: Option<f64>,
}

/// One observation slot of a user; `None` marks a missing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub time: NaiveDateTime,
    pub glucose: Option<f64>,
    pub heart_rate: Option<f64>,
    pub steps: Option<f64>,
}

/// All samples of one user, sorted by strictly increasing time.
///
/// Gaps between samples are allowed; nothing is resampled.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub user_id: UserId,
    pub samples: Vec<RawSample>,
}

impl RawSeries {
    pub fn glucose(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.glucose)
    }

    pub fn heart_rate(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.heart_rate)
    }

    pub fn steps(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().filter_map(|s| s.steps)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Wide-format synthetic glucose: one row per synthetic user, one column per
/// time point (`t_0 .. t_{n-1}`). Row index is the synthetic user id.
#[derive(Debug, Clone, PartialEq)]
pub struct GlucoseMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl GlucoseMatrix {
    pub fn n_users(&self) -> usize {
        self.rows.len()
    }

    pub fn n_timepoints(&self) -> usize {
        self.columns.len()
    }
}

/// One row of the materialized synthetic dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticRow {
    pub user_id: UserId,
    #[serde(serialize_with = "serialize_time")]
    pub time: NaiveDateTime,
    pub glucose: f64,
    pub heart_rate: i64,
    pub steps: i64,
}

fn serialize_time<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_time(t))
}
