use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::DataError;
use crate::reader::read_real_cohort;
use crate::record::{format_time, RawSample, RawSeries};
use crate::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Glucose,
    HeartRate,
    Steps,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Glucose, Column::HeartRate, Column::Steps];

    pub fn name(self) -> &'static str {
        match self {
            Column::Glucose => "glucose",
            Column::HeartRate => "heart_rate",
            Column::Steps => "steps",
        }
    }

    fn pick(self, s: &RawSample) -> Option<f64> {
        match self {
            Column::Glucose => s.glucose,
            Column::HeartRate => s.heart_rate,
            Column::Steps => s.steps,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "glucose" => Ok(Column::Glucose),
            "heart_rate" => Ok(Column::HeartRate),
            "steps" => Ok(Column::Steps),
            other => Err(format!("unknown column '{other}'")),
        }
    }
}

/// Selected columns of one user, in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFrame {
    pub user_id: UserId,
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<(Column, Vec<Option<f64>>)>,
}

impl UserFrame {
    pub fn column(&self, col: Column) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Writes the frame as CSV with a `timestamps` column first.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), DataError> {
        let mut wtr = csv::Writer::from_writer(out);
        let mut header = vec!["timestamps".to_string()];
        header.extend(self.columns.iter().map(|(c, _)| c.name().to_string()));
        wtr.write_record(&header)?;
        for (i, t) in self.timestamps.iter().enumerate() {
            let mut rec = vec![format_time(t)];
            for (_, values) in &self.columns {
                rec.push(values[i].map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&rec)?;
        }
        wtr.flush().map_err(|e| DataError::io("<output>", e))?;
        Ok(())
    }
}

/// Read-only access to a materialized dataset (real or synthetic), keyed by
/// user id.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesStore {
    users: BTreeMap<UserId, RawSeries>,
    id_limit: Option<UserId>,
}

impl TimeSeriesStore {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        Ok(Self::from_series(read_real_cohort(path)?))
    }

    pub fn from_series(series: Vec<RawSeries>) -> Self {
        Self {
            users: series.into_iter().map(|s| (s.user_id, s)).collect(),
            id_limit: None,
        }
    }

    /// Rejects ids at or above `limit` before looking them up.
    pub fn with_id_limit(mut self, limit: UserId) -> Self {
        self.id_limit = Some(limit);
        self
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.users.keys().copied().collect()
    }

    pub fn load_user(&self, user_id: UserId) -> Result<&RawSeries, DataError> {
        if let Some(limit) = self.id_limit {
            if user_id >= limit {
                return Err(DataError::UserOutOfRange { user_id, limit });
            }
        }
        self.users
            .get(&user_id)
            .ok_or(DataError::UnknownUser(user_id))
    }

    pub fn load_columns(&self, user_id: UserId, columns: &[Column]) -> Result<UserFrame, DataError> {
        let series = self.load_user(user_id)?;
        Ok(UserFrame {
            user_id,
            timestamps: series.samples.iter().map(|s| s.time).collect(),
            columns: columns
                .iter()
                .map(|&c| (c, series.samples.iter().map(|s| c.pick(s)).collect()))
                .collect(),
        })
    }
}
