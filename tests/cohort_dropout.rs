use pretty_assertions::assert_eq;
use tests::{glucose_matrix_csv, init_logger, real_cohort_csv, RealUser, Workspace, SLOTS_PER_DAY};
use vitalsynth::{
    extract_glucose_features, extract_hr_steps_features, join_features, run, run_files,
    PipelineConfig,
};
use vitalsynth_data::{read_glucose_matrix, read_real_cohort};

fn cohort_with_silent_watch() -> Workspace {
    let mut users: Vec<RealUser> = (0..4).map(RealUser::new).collect();
    users[2].no_heart_rate = true;
    Workspace::new(
        &real_cohort_csv(&users, 2, 5),
        &glucose_matrix_csv(6, SLOTS_PER_DAY, 9),
    )
    .unwrap()
}

#[test]
fn user_without_heart_rate_leaves_training_but_not_density() {
    init_logger();
    let ws = cohort_with_silent_watch();
    let real = read_real_cohort(&ws.real).unwrap();

    let glucose = extract_glucose_features(&real);
    let hr_steps = extract_hr_steps_features(&real);
    assert_eq!(glucose.user_ids, vec![0, 1, 2, 3]);
    assert_eq!(hr_steps.user_ids, vec![0, 1, 3]);
    assert_eq!(hr_steps.dropped, vec![2]);
    let joined = join_features(&glucose, &hr_steps);
    assert_eq!(joined.user_ids, vec![0, 1, 3]);

    let report = run_files(
        &PipelineConfig::default().with_seed(Some(3)),
        &ws.real,
        &ws.glucose,
        &ws.path("enhanced.csv"),
    )
    .unwrap();
    assert_eq!(report.real_users, 4);
    assert_eq!(report.dropped_hr_steps_users, vec![2]);
    assert!(report.dropped_glucose_users.is_empty());
    assert_eq!(report.training_users, 3);
    assert!(report.templates.iter().all(|t| t.real_user != 2));
    assert_eq!(report.output_rows, 6 * SLOTS_PER_DAY);
}

#[test]
fn report_lists_every_cluster_once() {
    let ws = cohort_with_silent_watch();
    let real = read_real_cohort(&ws.real).unwrap();
    let glucose = read_glucose_matrix(&ws.glucose).unwrap();
    let cfg = PipelineConfig {
        n_clusters: 8,
        n_samples: 20,
        n_estimators: 10,
        ..PipelineConfig::default().with_seed(Some(17))
    };
    let run = run(&cfg, &real, &glucose).unwrap();
    let r = &run.report;
    let mut seen: Vec<usize> = r
        .templates
        .iter()
        .map(|t| t.cluster)
        .chain(r.empty_clusters.iter().copied())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..8).collect::<Vec<_>>());
    assert_eq!(
        r.templates.iter().map(|t| t.size).sum::<usize>(),
        r.synthetic_samples
    );

    let json = serde_json::to_value(r).unwrap();
    assert_eq!(json["dropped_hr_steps_users"], serde_json::json!([2]));
}

#[test]
fn sensor_floor_across_cohort_still_synthesizes() {
    let users: Vec<RealUser> = (0..3)
        .map(|u| RealUser {
            sensor_floor: true,
            ..RealUser::new(u)
        })
        .collect();
    let ws = Workspace::new(
        &real_cohort_csv(&users, 2, 4),
        &glucose_matrix_csv(3, SLOTS_PER_DAY, 6),
    )
    .unwrap();
    let real = read_real_cohort(&ws.real).unwrap();
    let glucose = read_glucose_matrix(&ws.glucose).unwrap();
    let features = extract_glucose_features(&real);
    assert!(features.rows.iter().all(|f| f.min == 40.0));

    let run = run(&PipelineConfig::default().with_seed(Some(1)), &real, &glucose).unwrap();
    assert_eq!(run.report.degenerate_glucose_features, vec!["min".to_string()]);
    assert_eq!(run.dataset.len(), 3 * SLOTS_PER_DAY);
}
