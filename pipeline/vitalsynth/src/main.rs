use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use vitalsynth::{run_files, PipelineConfig};
use vitalsynth_data::{Column, TimeSeriesStore, UserId};

#[derive(Debug, Parser)]
#[command(
    name = "vitalsynth",
    version,
    about = "Synthesize heart-rate and step series for synthetic glucose cohorts",
    long_about = "vitalsynth learns how glucose relates to heart rate and step count in a\n\
        small real cohort and uses it to give every synthetic glucose user matching\n\
        heart-rate and step series on a 5-minute grid.\n\n\
        EXAMPLES:\n\
        \n  vitalsynth generate --real real.csv --glucose synt.csv --out enhanced.csv\n\
        \n  vitalsynth generate --real real.csv --glucose synt.csv --out enhanced.csv --seed 42\n\
        \n  vitalsynth show --dataset enhanced.csv --user 12 --columns glucose,heart_rate"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full synthesis pipeline once
    Generate(GenerateArgs),
    /// Print one user's series from a dataset as CSV
    Show(ShowArgs),
}

#[derive(Debug, Args, Clone)]
struct GenerateArgs {
    /// Real long-format cohort (user_id,time,glucose,heart_rate,steps)
    #[arg(long, value_name = "FILE")]
    real: PathBuf,

    /// Wide synthetic glucose matrix (t_0 .. t_N)
    #[arg(long, value_name = "FILE")]
    glucose: PathBuf,

    /// Output dataset, replaced atomically
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    /// TOML run configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for a reproducible run; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the run report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
struct ShowArgs {
    /// Dataset in long format
    #[arg(long, value_name = "FILE")]
    dataset: PathBuf,

    #[arg(long)]
    user: UserId,

    /// Columns to print
    #[arg(long, value_delimiter = ',', default_value = "glucose,heart_rate,steps")]
    columns: Vec<Column>,

    /// Reject user ids at or above this bound
    #[arg(long, value_name = "N")]
    id_limit: Option<UserId>,
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run_generate(args: &GenerateArgs) -> i32 {
    let cfg = match &args.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return 2;
            }
        },
        None => PipelineConfig::default(),
    }
    .with_seed(args.seed);

    match run_files(&cfg, &args.real, &args.glucose, &args.out) {
        Ok(report) => {
            log::info!(
                "wrote {} rows for {} users to {}",
                report.output_rows,
                report.output_users,
                args.out.display()
            );
            // The dataset is already in place; a missing report does not fail the run.
            if let Some(path) = &args.report {
                if let Err(e) = report.write_json(path) {
                    log::warn!("report not written: {e}");
                    eprintln!("warning: {e}");
                }
            }
            0
        }
        Err(e) => {
            log::error!("run failed: {e}");
            eprintln!("error: {e}");
            1
        }
    }
}

fn run_show(args: &ShowArgs) -> i32 {
    let store = match TimeSeriesStore::open(&args.dataset) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    let store = match args.id_limit {
        Some(limit) => store.with_id_limit(limit),
        None => store,
    };
    let frame = match store.load_columns(args.user, &args.columns) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    if let Err(e) = frame.write_csv(io::stdout().lock()) {
        eprintln!("error: {e}");
        return 1;
    }
    0
}

fn run_cli_from(args: impl IntoIterator<Item = OsString>) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { 2 } else { 0 };
        }
    };
    let _ = env_logger::Builder::new()
        .filter_level(level_for(cli.verbose))
        .try_init();

    match &cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Show(args) => run_show(args),
    }
}

fn run_cli() -> i32 {
    run_cli_from(std::env::args_os())
}

fn main() {
    std::process::exit(run_cli());
}
