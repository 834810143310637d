use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::DataError;
use crate::record::SyntheticRow;

/// Writes the whole dataset to `path` in one step.
///
/// Rows go to a temporary file in the destination directory, which is then
/// renamed over `path`. Readers see either the previous file or the complete
/// new one; on any error the temporary file is removed and `path` is untouched.
pub fn write_dataset_atomic(path: &Path, rows: &[SyntheticRow]) -> Result<(), DataError> {
    if rows.is_empty() {
        return Err(DataError::EmptyInput("refusing to write an empty dataset".into()));
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| DataError::io(dir, e))?;

    let mut wtr = csv::Writer::from_writer(tmp);
    for row in rows {
        wtr.serialize(row)?;
    }
    let mut tmp = wtr.into_inner().map_err(|e| {
        let err = e.error();
        DataError::io(path, std::io::Error::new(err.kind(), err.to_string()))
    })?;
    tmp.flush().map_err(|e| DataError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| DataError::io(path, e))?;

    tmp.persist(path).map_err(|e| DataError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    log::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn row(user_id: u32, minute: u32) -> SyntheticRow {
        SyntheticRow {
            user_id,
            time: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, minute, 0)
                .unwrap(),
            glucose: 101.5,
            heart_rate: 72,
            steps: 0,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("synthetic.csv");
        write_dataset_atomic(&out, &[row(0, 0), row(0, 5)]).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "user_id,time,glucose,heart_rate,steps\n\
             0,2025-06-01 00:00:00,101.5,72,0\n\
             0,2025-06-01 00:05:00,101.5,72,0\n"
        );
        // only the final file remains in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("synthetic.csv");
        std::fs::write(&out, "previous").unwrap();
        assert!(write_dataset_atomic(&out, &[]).is_err());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nope").join("synthetic.csv");
        assert!(matches!(
            write_dataset_atomic(&out, &[row(0, 0)]),
            Err(DataError::Io { .. })
        ));
    }
}
