//! Run counters and the per-pass report.

use serde::{Deserialize, Serialize};

/// Counters for one pass, owned by the pipeline and zeroed at its start.
///
/// `records_accepted <= records_seen` holds at every point of a run,
/// aborted ones included; both only ever grow.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    /// Records decoded successfully.
    pub records_seen: u64,
    /// Records that passed the acceptance test and were written out.
    pub records_accepted: u64,
    /// Record slots that failed to decode.
    pub decode_errors: u64,
}

impl RunStats {
    /// All counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { records_seen: 0, records_accepted: 0, decode_errors: 0 }
    }
}

/// How the streaming loop ended.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The iteration bound (or a clean end of stream) was reached.
    Completed,
    /// The decode-error budget was exhausted and the loop stopped early.
    /// The partial output is still finalized.
    Aborted,
}

/// Outcome of one pipeline run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    /// Final counters.
    pub stats: RunStats,
    /// How the loop ended.
    pub termination: Termination,
    /// Whether the output header was successfully rewritten to match the
    /// written records. When `false` the record data is intact but the
    /// aggregate metadata is stale.
    pub header_synced: bool,
}

impl RunReport {
    /// Whether the pass stopped early on the decode-error budget.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        matches!(self.termination, Termination::Aborted)
    }
}
