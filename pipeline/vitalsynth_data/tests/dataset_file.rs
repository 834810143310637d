use chrono::{Duration, NaiveDate};
use vitalsynth_data::{
    read_glucose_matrix, write_dataset_atomic, Column, DataError, SyntheticRow, TimeSeriesStore,
};

fn rows(users: u32, slots: i64) -> Vec<SyntheticRow> {
    let anchor = NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut out = Vec::new();
    for u in 0..users {
        for i in 0..slots {
            out.push(SyntheticRow {
                user_id: u,
                time: anchor + Duration::minutes(5 * i),
                glucose: 100.0 + i as f64,
                heart_rate: 60 + i,
                steps: i * 2,
            });
        }
    }
    out
}

#[test]
fn written_dataset_reads_back_through_store() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enhanced.csv");
    write_dataset_atomic(&path, &rows(3, 4)).unwrap();

    let store = TimeSeriesStore::open(&path).unwrap().with_id_limit(201);
    assert_eq!(store.user_ids(), vec![0, 1, 2]);
    let frame = store.load_columns(2, &[Column::HeartRate]).unwrap();
    assert_eq!(frame.len(), 4);
    assert_eq!(
        frame.column(Column::HeartRate).unwrap(),
        &[Some(60.0), Some(61.0), Some(62.0), Some(63.0)]
    );
    assert_eq!(
        frame.timestamps[3] - frame.timestamps[0],
        Duration::minutes(15)
    );
    assert!(matches!(
        store.load_user(250),
        Err(DataError::UserOutOfRange { .. })
    ));
}

#[test]
fn rewriting_replaces_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enhanced.csv");
    write_dataset_atomic(&path, &rows(5, 2)).unwrap();
    write_dataset_atomic(&path, &rows(1, 2)).unwrap();
    let store = TimeSeriesStore::open(&path).unwrap();
    assert_eq!(store.user_ids(), vec![0]);
}

#[test]
fn glucose_matrix_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prepr_synt.csv");
    let header: Vec<String> = (0..288).map(|i| format!("t_{i}")).collect();
    let row: Vec<String> = (0..288).map(|i| format!("{}", 90.0 + (i % 12) as f64)).collect();
    let text = format!("{}\n{}\n{}\n", header.join(","), row.join(","), row.join(","));
    std::fs::write(&path, text).unwrap();

    let m = read_glucose_matrix(&path).unwrap();
    assert_eq!(m.n_users(), 2);
    assert_eq!(m.n_timepoints(), 288);
    assert_eq!(m.rows[1][13], 91.0);
}

#[test]
fn missing_file_is_io_error() {
    let err = read_glucose_matrix("/definitely/not/here.csv".as_ref()).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}
