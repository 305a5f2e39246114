use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use common::log_setup::setup_logging;
use qd_scan::observer::AttemptLog;
use qd_scan::{run_simulation, save_outputs, RunConfig, SmoothingMethod};

/// Raster scan of a simulated quantum dot sample.
#[derive(Parser, Debug)]
#[command(name = "qd_scan", about, long_about = None)]
struct Args {
    /// YAML run configuration
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Seed for the simulated devices, overrides the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Smoothing method (mean, fast_mean), overrides the configuration
    #[arg(long)]
    smoothing: Option<SmoothingMethod>,

    /// Do not print the per-attempt log
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = RunConfig::from_yaml_file(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(smoothing) = args.smoothing {
        config.smoothing = smoothing;
    }

    let _logger = setup_logging(&config.logging.level, config.logging.file.as_deref())
        .context("Failed to start logging")?;

    let mut attempts = AttemptLog::new();
    let report = run_simulation(&config, &mut attempts).context("Invalid configuration or device setup")?;
    save_outputs(&report, &config.output).context("Failed to save results")?;

    if !args.quiet {
        println!("{}", attempts.report());
    }
    println!("{report}");
    println!(
        "Results: {}, {}",
        config.output.csv_file.display(),
        config.output.heatmap_file.display()
    );

    Ok(())
}
