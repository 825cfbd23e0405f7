//! phspcut-filter — the record-streaming acceptance filter.
//!
//! One linear pass over one input dataset producing one output dataset:
//! decode each record, project its position onto a transverse plane, keep it
//! if the projection lands inside a rectangular window, and finally rewrite
//! the output header so its statistics match what was actually written.
//!
//! ```no_run
//! use phspcut_filter::{FilterConfig, FilterPipeline};
//! use phspcut_phsp::{PhspReader, PhspWriter};
//! # fn main() -> Result<(), phspcut_phsp::PhspError> {
//! let cfg = FilterConfig::default();
//! let mut src = PhspReader::open("linac".as_ref())?;
//! src.validate_layout(cfg.strict_layout)?;
//! let mut dst = PhspWriter::create("linac_cut".as_ref())?;
//! dst.copy_header_from(&src)?;
//! dst.set_extra_counts(0, 0);
//! let report = FilterPipeline::new(cfg).run(&mut src, &mut dst)?;
//! println!("kept {} of {}", report.stats.records_accepted, report.stats.records_seen);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Immutable per-run configuration and its validation.
pub mod config;
/// Pure plane-projection acceptance predicate.
pub mod geometry;
/// The read → predicate → write driver with the decode-error budget.
pub mod pipeline;
/// Run counters and the per-pass report.
pub mod stats;
/// Output-header synchronization after a pass.
pub mod sync;

// ---- Re-exports for workspace compatibility ----
pub use config::{ConfigError, FilterConfig};
pub use geometry::Acceptance;
pub use pipeline::{FilterPipeline, HEADER_OVERCOUNT};
pub use stats::{RunReport, RunStats, Termination};
pub use sync::finalize_header;
