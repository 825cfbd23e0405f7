//! phspcut-phsp — IAEA-style phase-space dataset layer.
//!
//! This crate defines the **stable boundary** the filtering pipeline works
//! against:
//! - the ASCII header codec for `<base>.IAEAheader` artifacts,
//! - the fixed-layout binary record codec for `<base>.IAEAphsp` streams,
//! - a one-record-at-a-time [`PhspReader`] and a counting [`PhspWriter`], and
//! - a deterministic synthetic beam [`generator`] for tests and benches.
//!
//! A dataset is always a pair of artifacts named by appending fixed suffixes
//! to one base path; headers and record streams are paired 1:1.
//!
//! ```no_run
//! use phspcut_phsp::{Decoded, PhspReader};
//! # fn main() -> phspcut_phsp::Result<()> {
//! let mut src = PhspReader::open("water_tank".as_ref())?;
//! src.validate_layout(false)?;
//! while let Some(slot) = src.read_record()? {
//!     match slot {
//!         Decoded::Record(r) => println!("E = {} MeV", r.energy),
//!         Decoded::Malformed(defect) => eprintln!("bad slot: {defect}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Error taxonomy for the dataset layer.
pub mod error;
/// Deterministic synthetic beam source (for sims/benches/tests).
pub mod generator;
/// ASCII header codec, artifact paths, and layout bookkeeping.
pub mod header;
/// Streaming record reader with layout validation.
pub mod reader;
/// Fixed-layout binary record codec.
pub mod record;
/// Counting record writer with deferred header commit.
pub mod writer;

// ---- Re-exports for workspace compatibility ----
pub use error::{LayoutDefect, PhspError, Result};
pub use header::{
    header_path, record_path, remove_dataset, ByteOrder, PhspHeader, HEADER_SUFFIX, RECORD_SUFFIX,
};
pub use reader::PhspReader;
pub use record::{record_length, Decoded, ParticleKind, Record, RecordDefect, BASE_RECORD_LENGTH};
pub use writer::PhspWriter;
