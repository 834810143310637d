use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::DataError;
use crate::record::{format_time, parse_time, GlucoseMatrix, RawRecord, RawSample, RawSeries};
use crate::UserId;

pub const REAL_COLUMNS: [&str; 5] = ["user_id", "time", "glucose", "heart_rate", "steps"];
pub const TIMEPOINT_PREFIX: &str = "t_";

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|e| DataError::io(path, e))
}

fn require_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    path: &Path,
) -> Result<(), DataError> {
    for col in required {
        if !headers.iter().any(|h| h.trim() == *col) {
            return Err(DataError::MissingColumn {
                column: (*col).to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Reads the real long-format cohort and groups it into one series per user,
/// ordered by user id.
pub fn read_real_cohort(path: &Path) -> Result<Vec<RawSeries>, DataError> {
    log::info!("reading real cohort from {}", path.display());
    parse_real_cohort(open(path)?, path)
}

pub fn parse_real_cohort<R: Read>(input: R, origin: &Path) -> Result<Vec<RawSeries>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    require_columns(rdr.headers()?, &REAL_COLUMNS, origin)?;

    let mut by_user: BTreeMap<UserId, Vec<RawSample>> = BTreeMap::new();
    for rec in rdr.deserialize::<RawRecord>() {
        let rec = rec?;
        let time = parse_time(&rec.time).ok_or_else(|| DataError::BadTimestamp {
            user_id: rec.user_id,
            value: rec.time.clone(),
        })?;
        by_user.entry(rec.user_id).or_default().push(RawSample {
            time,
            glucose: rec.glucose.filter(|v| v.is_finite()),
            heart_rate: rec.heart_rate.filter(|v| v.is_finite()),
            steps: rec.steps.filter(|v| v.is_finite()),
        });
    }
    if by_user.is_empty() {
        return Err(DataError::EmptyInput(format!(
            "no rows in {}",
            origin.display()
        )));
    }

    let mut cohort = Vec::with_capacity(by_user.len());
    for (user_id, mut samples) in by_user {
        samples.sort_by_key(|s| s.time);
        if let Some(w) = samples.windows(2).find(|w| w[0].time == w[1].time) {
            return Err(DataError::DuplicateTimestamp {
                user_id,
                time: format_time(&w[0].time),
            });
        }
        cohort.push(RawSeries { user_id, samples });
    }
    log::debug!(
        "real cohort: {} users, {} rows",
        cohort.len(),
        cohort.iter().map(RawSeries::len).sum::<usize>()
    );
    Ok(cohort)
}

/// Reads the wide synthetic glucose matrix. Only `t_<index>` columns are kept,
/// ordered by their numeric index; any other column is ignored.
pub fn read_glucose_matrix(path: &Path) -> Result<GlucoseMatrix, DataError> {
    log::info!("reading synthetic glucose matrix from {}", path.display());
    parse_glucose_matrix(open(path)?, path)
}

pub fn parse_glucose_matrix<R: Read>(input: R, origin: &Path) -> Result<GlucoseMatrix, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let headers = rdr.headers()?.clone();

    let mut slots: Vec<(usize, usize, String)> = Vec::new();
    for (pos, h) in headers.iter().enumerate() {
        if let Some(suffix) = h.strip_prefix(TIMEPOINT_PREFIX) {
            let idx: usize = suffix
                .parse()
                .map_err(|_| DataError::BadMatrix(format!("malformed timepoint column '{h}'")))?;
            slots.push((idx, pos, h.to_string()));
        }
    }
    if slots.is_empty() {
        return Err(DataError::MissingColumn {
            column: format!("{TIMEPOINT_PREFIX}0"),
            path: origin.to_path_buf(),
        });
    }
    slots.sort_by_key(|(idx, _, _)| *idx);
    for (expected, (idx, _, name)) in slots.iter().enumerate() {
        if *idx != expected {
            return Err(DataError::BadMatrix(format!(
                "timepoint columns are not contiguous: expected {TIMEPOINT_PREFIX}{expected}, found {name}"
            )));
        }
    }

    let mut rows = Vec::new();
    for (r, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let mut row = Vec::with_capacity(slots.len());
        for (_, pos, name) in &slots {
            let cell = rec.get(*pos).unwrap_or("");
            let v: f64 = cell.parse().map_err(|_| {
                DataError::BadMatrix(format!("row {r}, column {name}: '{cell}' is not a number"))
            })?;
            if !v.is_finite() {
                return Err(DataError::BadMatrix(format!(
                    "row {r}, column {name}: non-finite value"
                )));
            }
            row.push(v);
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(DataError::EmptyInput(format!(
            "no rows in {}",
            origin.display()
        )));
    }
    log::debug!("glucose matrix: {} users x {} timepoints", rows.len(), slots.len());
    Ok(GlucoseMatrix {
        columns: slots.into_iter().map(|(_, _, n)| n).collect(),
        rows,
    })
}
