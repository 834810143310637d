//! Fixture generators shared by the workspace tests.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SLOTS_PER_DAY: usize = 288;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 3)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Knobs for one real user of the fixture cohort.
#[derive(Debug, Clone, Copy)]
pub struct RealUser {
    pub user_id: u32,
    pub glucose_base: f64,
    pub glucose_swing: f64,
    pub hr_base: f64,
    pub activity: f64,
    /// Leave every heart-rate cell empty.
    pub no_heart_rate: bool,
    /// Every 100th glucose reading sits on the sensor floor of 40.
    pub sensor_floor: bool,
}

impl RealUser {
    pub fn new(user_id: u32) -> Self {
        let u = user_id as f64;
        Self {
            user_id,
            glucose_base: 100.0 + 15.0 * u,
            glucose_swing: 12.0 + 6.0 * u,
            hr_base: 62.0 + 7.0 * u,
            activity: 20.0 + 25.0 * u,
            no_heart_rate: false,
            sensor_floor: false,
        }
    }
}

/// Long-format real cohort CSV: `days` days of 5-minute rows per user.
pub fn real_cohort_csv(users: &[RealUser], days: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from("user_id,time,glucose,heart_rate,steps\n");
    let t0 = start();
    for user in users {
        for i in 0..days * SLOTS_PER_DAY {
            let t = t0 + Duration::minutes(5 * i as i64);
            let phase = (i % SLOTS_PER_DAY) as f64 / SLOTS_PER_DAY as f64 * std::f64::consts::TAU;
            let mut glucose =
                user.glucose_base + user.glucose_swing * phase.sin() + rng.gen_range(-6.0..6.0);
            if user.sensor_floor && i % 100 == 0 {
                glucose = 40.0;
            }
            let hr = user.hr_base + 10.0 * (phase - 1.0).sin().max(0.0) + rng.gen_range(-4.0..4.0);
            let steps = (user.activity * (phase - 0.5).sin().max(0.0) + rng.gen_range(0.0..8.0))
                .round();
            let hr_cell = if user.no_heart_rate {
                String::new()
            } else {
                format!("{:.0}", hr)
            };
            let _ = writeln!(
                out,
                "{},{},{:.1},{},{}",
                user.user_id,
                t.format("%Y-%m-%d %H:%M:%S"),
                glucose,
                hr_cell,
                steps
            );
        }
    }
    out
}

/// Wide synthetic glucose matrix CSV with `users` rows of `slots` values.
pub fn glucose_matrix_csv(users: usize, slots: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let header: Vec<String> = (0..slots).map(|i| format!("t_{i}")).collect();
    let mut out = header.join(",");
    out.push('\n');
    for u in 0..users {
        let base = 95.0 + 4.0 * u as f64;
        let row: Vec<String> = (0..slots)
            .map(|i| {
                let phase = i as f64 / slots as f64 * std::f64::consts::TAU;
                format!("{:.2}", base + 20.0 * phase.sin() + rng.gen_range(-5.0..5.0))
            })
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Input files of one run inside a temporary directory.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub real: PathBuf,
    pub glucose: PathBuf,
}

impl Workspace {
    pub fn new(real_csv: &str, glucose_csv: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let real = dir.path().join("prepr_real.csv");
        let glucose = dir.path().join("prepr_synt.csv");
        std::fs::write(&real, real_csv)?;
        std::fs::write(&glucose, glucose_csv)?;
        Ok(Self { dir, real, glucose })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// The standard scenario: three real users over seven days and ten synthetic
/// glucose users over one day.
pub fn standard_workspace() -> std::io::Result<Workspace> {
    let users: Vec<RealUser> = (0..3).map(RealUser::new).collect();
    Workspace::new(
        &real_cohort_csv(&users, 7, 11),
        &glucose_matrix_csv(10, SLOTS_PER_DAY, 23),
    )
}
