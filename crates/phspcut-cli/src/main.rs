// crates/phspcut-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::Parser;
use phspcut_filter::{FilterConfig, FilterPipeline, RunReport};
use phspcut_phsp::{record_path, remove_dataset, PhspReader, PhspWriter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "phspcut",
    about = "Cut a phase-space dataset down to a rectangular acceptance window",
    long_about = "Cut a phase-space dataset down to a rectangular acceptance window.\n\nEach record's position is projected along its direction onto a transverse plane; records whose projection lands inside the window are copied to the output dataset, whose header statistics are then recomputed to match.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    /// Input dataset base path (without the .IAEAheader/.IAEAphsp suffix)
    input: PathBuf,

    /// Output dataset base path; pre-existing artifacts there are deleted
    output: PathBuf,

    /// JSON file with a full filter configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Projection plane position on the transport axis (cm)
    #[arg(long)]
    plane_z: Option<f32>,

    /// Lower x bound of the acceptance window (cm)
    #[arg(long)]
    x_min: Option<f32>,

    /// Upper x bound of the acceptance window (cm)
    #[arg(long)]
    x_max: Option<f32>,

    /// Lower y bound of the acceptance window (cm)
    #[arg(long)]
    y_min: Option<f32>,

    /// Upper y bound of the acceptance window (cm)
    #[arg(long)]
    y_max: Option<f32>,

    /// Stop the pass once strictly more than this many records fail to decode
    #[arg(long)]
    error_threshold: Option<u64>,

    /// Log a progress line every N processed records
    #[arg(long)]
    progress_every: Option<u64>,

    /// Forward the extra payload instead of stripping it from the output
    #[arg(long, default_value_t = false)]
    keep_extras: bool,

    /// Fail on any header/stream size inconsistency instead of warning
    #[arg(long, default_value_t = false)]
    strict_layout: bool,

    /// Write the run report to this path as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    cfg.validate().context("invalid filter configuration")?;

    remove_dataset(&cli.output)
        .with_context(|| format!("removing stale output artifacts at {}", cli.output.display()))?;

    let mut src = PhspReader::open(&cli.input)
        .with_context(|| format!("opening input dataset {}", cli.input.display()))?;
    src.validate_layout(cfg.strict_layout)
        .with_context(|| format!("validating layout of {}", cli.input.display()))?;

    let mut dst = PhspWriter::create(&cli.output)
        .with_context(|| format!("creating output dataset {}", cli.output.display()))?;
    dst.copy_header_from(&src).context("copying header to output")?;
    if cfg.strip_extras {
        dst.set_extra_counts(0, 0);
    } else {
        let (nf, nl) = src.extra_counts();
        dst.set_extra_counts(nf, nl);
    }

    info!(input = %cli.input.display(), output = %cli.output.display(), "filtering");
    let report = FilterPipeline::new(cfg)
        .run(&mut src, &mut dst)
        .context("streaming pass failed")?;

    print_summary(&report, &cli.output);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Start from defaults or a JSON config file, then let flags override.
fn build_config(cli: &Cli) -> Result<FilterConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => FilterConfig::default(),
    };

    if let Some(v) = cli.plane_z {
        cfg.acceptance.plane_z = v;
    }
    if let Some(v) = cli.x_min {
        cfg.acceptance.x_min = v;
    }
    if let Some(v) = cli.x_max {
        cfg.acceptance.x_max = v;
    }
    if let Some(v) = cli.y_min {
        cfg.acceptance.y_min = v;
    }
    if let Some(v) = cli.y_max {
        cfg.acceptance.y_max = v;
    }
    if let Some(v) = cli.error_threshold {
        cfg.error_threshold = v;
    }
    if let Some(v) = cli.progress_every {
        cfg.progress_interval = v;
    }
    if cli.keep_extras {
        cfg.strip_extras = false;
    }
    if cli.strict_layout {
        cfg.strict_layout = true;
    }
    Ok(cfg)
}

fn print_summary(report: &RunReport, output: &Path) {
    println!("Records processed: {}", report.stats.records_seen);
    println!("Records accepted:  {}", report.stats.records_accepted);
    if report.stats.decode_errors > 0 {
        println!("Decode failures:   {}", report.stats.decode_errors);
    }
    if report.aborted() {
        println!("Stopped early: decode-error budget exhausted; partial output was finalized.");
    }
    if !report.header_synced {
        println!("Warning: output header could not be updated; record data is intact.");
    }
    if let Ok(meta) = fs::metadata(record_path(output)) {
        println!("Output record stream: {} bytes ({})", meta.len(), record_path(output).display());
    }
}
