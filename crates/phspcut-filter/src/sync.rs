//! Output-header synchronization.

use phspcut_phsp::{PhspError, PhspWriter};
use tracing::debug;

use crate::stats::RunStats;

/// Rewrite the output header so its statistics match the records actually
/// written.
///
/// The filtered dataset's original-histories count is set to the number of
/// accepted records: downstream consumers normalize per history, and after a
/// cut the only self-consistent history count is the record count itself.
/// The particle count and checksum are recomputed by the writer from its
/// running tally.
///
/// A failure here leaves already-written record data untouched; only the
/// aggregate metadata may be stale.
pub fn finalize_header(dst: &mut PhspWriter, stats: &RunStats) -> Result<(), PhspError> {
    dst.set_original_histories(stats.records_accepted);
    dst.commit_header()?;
    debug!(
        particles = dst.records_written(),
        histories = stats.records_accepted,
        "output header synchronized"
    );
    Ok(())
}
