mod commands;
mod logging;
mod progress;

use std::fs;
use std::path::Path;
use std::process;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, FilterArgs};
use dotenv::dotenv;
use fs_image_core::{
    AppConfig, FileFilter, HashEngine, HashSummary, ScanJob, ScanSummary, Scanner, StorageGate,
};
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match fs_image_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let outcome = match &args.command {
        Some(Commands::CreateImage { job }) => {
            run_with_job(&config, &args, job, |gate, job| {
                run_create_image(gate, job).map(|_| ())
            })
        }
        Some(Commands::CalcHashes {
            job,
            filter,
            recalc,
        }) => run_with_job(&config, &args, job, |gate, _| {
            run_calc_hashes(&config, gate, &to_filter(filter), !recalc).map(|_| ())
        }),
        Some(Commands::Scan { job }) => run_with_job(&config, &args, job, |gate, job| {
            let gate = run_create_image(gate, job)?;
            run_calc_hashes(&config, gate, &FileFilter::all(), true).map(|_| ())
        }),
        Some(Commands::History { job }) => {
            run_with_job(&config, &args, job, |gate, _| run_history(gate))
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn to_filter(args: &FilterArgs) -> FileFilter {
    let mut filter = FileFilter::all();
    if let Some(pattern) = &args.name_like {
        filter = filter.with_name_like(pattern);
    }
    if let Some(min) = args.min_size {
        filter = filter.with_min_size(min);
    }
    if let Some(max) = args.max_size {
        filter = filter.with_max_size(max);
    }
    filter
}

/// Look the job up, resolve its image file and hand a fresh gate to `run`.
fn run_with_job<F>(config: &AppConfig, args: &Cli, job_name: &str, run: F) -> Result<()>
where
    F: FnOnce(StorageGate, &ScanJob) -> Result<()>,
{
    let job = config
        .job(job_name)
        .ok_or_else(|| anyhow!("scans has no \"{}\"", job_name))?;

    let db_path = match &args.db {
        Some(db) => db.clone(),
        None => {
            let save_dir = Path::new(&config.save_dir);
            fs::create_dir_all(save_dir)
                .with_context(|| format!("creating save dir {}", save_dir.display()))?;
            job.db_path(save_dir, Local::now().date_naive())
                .to_string_lossy()
                .into_owned()
        }
    };
    info!("Using image {}", db_path.cyan());

    let gate = StorageGate::new(&db_path).with_batch_size(config.batch_size);
    run(gate, job)
}

fn run_create_image(gate: StorageGate, job: &ScanJob) -> Result<StorageGate> {
    let mut scanner = Scanner::new(gate);
    let reporter = CliReporter::new();
    let summary: ScanSummary = scanner.create_image(&job.scan_params(), &reporter)?;

    info!(
        "Image: {} dirs, {} files, {} ignored in {}",
        format!("{}", summary.dirs_found).green(),
        format!("{}", summary.files_found).green(),
        format!("{}", summary.dirs_ignored).yellow(),
        format!("{:.2}s", summary.duration.as_secs_f64()).green(),
    );
    Ok(scanner.into_gate())
}

fn run_calc_hashes(
    config: &AppConfig,
    gate: StorageGate,
    filter: &FileFilter,
    add_only: bool,
) -> Result<HashSummary> {
    let mut engine = HashEngine::new(gate).with_algorithm(config.hash_algorithm);
    let reporter = CliReporter::new();
    let summary = engine.calc_hashes_for_files(filter, add_only, &reporter)?;

    info!(
        "Hashes: {} files, {} already hashed, {} calculated, {}",
        format!("{}", summary.files).green(),
        format!("{}", summary.has_hash).cyan(),
        format!("{}", summary.calculated).green(),
        format!("{:.1} MiB/s", summary.rate_mib_per_sec()).cyan(),
    );
    Ok(summary)
}

fn run_history(mut gate: StorageGate) -> Result<()> {
    gate.open()?;
    for event in gate.history()? {
        let kind = match event.event.as_str() {
            "error" => event.event.red(),
            "warning" => event.event.yellow(),
            _ => event.event.normal(),
        };
        println!("{}  {:<20} {}", event.timestamp.dimmed(), kind, event.message);
    }
    Ok(())
}
