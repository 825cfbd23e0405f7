//! phspcut-bench-harness
//!
//! Run small end-to-end benchmarks (synthesize -> filter -> resync header)
//! and append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p phspcut-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run -p phspcut-bench-harness -- --profile benchmarks/profiles/medium.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use phspcut_filter::{FilterConfig, FilterPipeline};
use phspcut_phsp::{generator::generate_beam, remove_dataset, PhspReader, PhspWriter};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Records in the synthetic input dataset
    n_records: u64,
    /// Extra float fields per input record
    extra_floats: u32,
    /// Extra integer fields per input record
    extra_longs: u32,
    /// Repetitions of the filtering pass
    repeats: u32,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));
    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {profile_path:?}"))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    println!(
        "Profile: n_records={}, extras=({}, {}), repeats={}",
        profile.n_records, profile.extra_floats, profile.extra_longs, profile.repeats
    );

    fs::create_dir_all("benchmarks/reports").ok();

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before epoch")?
        .as_secs();
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::File::create(&csv_path)
        .with_context(|| format!("create report {csv_path:?}"))?;
    writeln!(csv, "repeat,records,accepted,decode_errors,wall_ms,records_per_s")?;

    let mut scratch = std::env::temp_dir();
    scratch.push(format!("phspcut_bench_{ts}"));
    let input = scratch.join("beam_in");
    let output = scratch.join("beam_cut");
    fs::create_dir_all(&scratch).context("create scratch dir")?;

    // Synthesize the input once; every repeat filters the same dataset.
    let synth_start = Instant::now();
    let beam = generate_beam(profile.n_records, profile.extra_floats, profile.extra_longs);
    let mut w = PhspWriter::create(&input).context("create input dataset")?;
    w.set_extra_counts(profile.extra_floats, profile.extra_longs);
    for r in &beam {
        w.write_record(r)?;
    }
    w.set_original_histories(profile.n_records);
    w.commit_header().context("commit input header")?;
    drop(beam);
    println!("Synthesized {} records in {} ms", profile.n_records, dur_ms(synth_start.elapsed()));

    let cfg = FilterConfig::default();
    for repeat in 0..profile.repeats {
        remove_dataset(&output).context("clear previous output")?;

        let start = Instant::now();
        let mut src = PhspReader::open(&input)?;
        src.validate_layout(cfg.strict_layout)?;
        let mut dst = PhspWriter::create(&output)?;
        dst.copy_header_from(&src)?;
        dst.set_extra_counts(0, 0);
        let report = FilterPipeline::new(cfg.clone())
            .run(&mut src, &mut dst)
            .context("filtering pass failed")?;
        let wall = start.elapsed();

        let per_s = if wall.as_secs_f64() > 0.0 {
            (report.stats.records_seen as f64 / wall.as_secs_f64()) as u64
        } else {
            0
        };
        println!(
            "repeat {repeat}: seen={}, accepted={}, wall={} ms, {} rec/s",
            report.stats.records_seen,
            report.stats.records_accepted,
            dur_ms(wall),
            per_s
        );
        writeln!(
            csv,
            "{repeat},{},{},{},{},{per_s}",
            report.stats.records_seen,
            report.stats.records_accepted,
            report.stats.decode_errors,
            dur_ms(wall)
        )?;
    }

    remove_dataset(&input).ok();
    remove_dataset(&output).ok();
    fs::remove_dir(&scratch).ok();
    println!("Report: {}", csv_path.display());
    Ok(())
}
