//! The record-streaming filter pipeline.
//!
//! Pulls one record at a time from the reader, applies the acceptance test,
//! forwards accepted records **verbatim** to the writer, and keeps the run
//! counters. Decode failures are budgeted, not fatal: the pass continues
//! past them until the budget is exhausted, and even then the partial output
//! is finalized so downstream consumers see a self-consistent dataset.
//!
//! A run moves through open → stream → finalize → close; the error-budget
//! abort is a branch inside the streaming stage that still reaches
//! finalization. Only storage faults escape early.

use phspcut_phsp::{Decoded, PhspError, PhspReader, PhspWriter};
use tracing::{debug, error, info, warn};

use crate::config::FilterConfig;
use crate::stats::{RunReport, RunStats, Termination};
use crate::sync::finalize_header;

/// How many records the header of a legacy dataset declares beyond what its
/// record stream actually holds. Discounted once from the iteration bound.
///
/// Whether every upstream producer shares this quirk or only the one this
/// tool grew up against is unsettled; the reader additionally treats a clean
/// early end of stream as a normal loop exit, so a dataset with exact counts
/// only ever leaves its last declared record unread, never fails.
pub const HEADER_OVERCOUNT: u64 = 1;

/// One-pass filter driver.
///
/// Owns nothing but the immutable configuration; reader and writer are
/// borrowed exclusively per run, so independent runs with different
/// geometries can coexist.
#[derive(Clone, Debug)]
pub struct FilterPipeline {
    cfg: FilterConfig,
}

impl FilterPipeline {
    /// Build a pipeline around a configuration.
    #[must_use]
    pub const fn new(cfg: FilterConfig) -> Self {
        Self { cfg }
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.cfg
    }

    /// Stream every readable record from `src`, forward the accepted ones to
    /// `dst`, then synchronize the output header with what was written.
    ///
    /// Returns the run report in every soft outcome, including the
    /// error-budget abort; a failed header synchronization is reported in
    /// the report, not as an error. Reader/writer storage faults propagate
    /// immediately and leave the counters undefined for this run.
    pub fn run(&self, src: &mut PhspReader, dst: &mut PhspWriter) -> Result<RunReport, PhspError> {
        let mut stats = RunStats::new();
        let mut termination = Termination::Completed;
        let progress_interval = self.cfg.progress_interval.max(1);

        let declared = src.declared_record_count();
        let bound = declared.saturating_sub(HEADER_OVERCOUNT);
        info!(declared, bound, "streaming records");

        for index in 0..bound {
            let Some(slot) = src.read_record()? else {
                debug!(index, declared, "record stream ended before the declared bound");
                break;
            };
            match slot {
                Decoded::Record(record) => {
                    stats.records_seen += 1;
                    if self.cfg.acceptance.accepts(record.position(), record.direction()) {
                        dst.write_record(&record)?;
                        stats.records_accepted += 1;
                    }
                    if stats.records_seen % progress_interval == 0 {
                        info!(
                            processed = stats.records_seen,
                            accepted = stats.records_accepted,
                            "progress"
                        );
                    }
                }
                Decoded::Malformed(defect) => {
                    stats.decode_errors += 1;
                    warn!(record = index, %defect, errors = stats.decode_errors,
                        "skipping malformed record");
                    if stats.decode_errors > self.cfg.error_threshold {
                        warn!(
                            threshold = self.cfg.error_threshold,
                            "decode-error budget exhausted, stopping early"
                        );
                        termination = Termination::Aborted;
                        break;
                    }
                }
            }
        }

        let header_synced = match finalize_header(dst, &stats) {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "output header could not be updated; record data is intact");
                false
            }
        };

        debug_assert!(stats.records_accepted <= stats.records_seen);
        Ok(RunReport { stats, termination, header_synced })
    }
}
