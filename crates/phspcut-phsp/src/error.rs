//! Error taxonomy for the dataset layer.
//!
//! Structural faults (open, format, header) are fatal for the pass that hits
//! them. Per-record decode defects are **not** errors at this level; they
//! travel as [`crate::record::Decoded::Malformed`] so callers can budget them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for dataset-layer results.
pub type Result<T> = std::result::Result<T, PhspError>;

/// Faults raised by the dataset layer.
#[derive(Debug, Error)]
pub enum PhspError {
    /// An artifact of the dataset could not be opened or created.
    #[error("cannot open {path}: {source}")]
    Open {
        /// Path of the artifact that failed to open.
        path: PathBuf,
        /// Underlying I/O fault.
        #[source]
        source: std::io::Error,
    },

    /// The header text could not be parsed.
    #[error("malformed header: {reason}")]
    HeaderParse {
        /// What was wrong, naming the offending `$SECTION` where known.
        reason: String,
    },

    /// Header and record stream disagree structurally.
    #[error("layout mismatch: {0}")]
    FormatMismatch(LayoutDefect),

    /// The source header could not be taken over into the output dataset.
    #[error("header copy rejected: {reason}")]
    HeaderCopy {
        /// Why the copy was refused.
        reason: String,
    },

    /// Rewriting the output header failed. Already-written record data is
    /// unaffected; only the aggregate metadata may be stale.
    #[error("header update failed for {path}: {source}")]
    HeaderUpdate {
        /// Path of the header artifact.
        path: PathBuf,
        /// Underlying I/O fault.
        #[source]
        source: std::io::Error,
    },

    /// The record stream ended in the middle of a record slot.
    #[error("truncated record slot {index}: got {got} of {want} bytes")]
    TruncatedRecord {
        /// Zero-based index of the slot that was cut short.
        index: u64,
        /// Bytes actually available.
        got: usize,
        /// Bytes a full slot occupies.
        want: usize,
    },

    /// Underlying storage fault; always fatal for the current pass.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Specific ways a header and its record stream can disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutDefect {
    /// The byte-order marker is not the supported little-endian marker.
    ByteOrder {
        /// Marker found in the header.
        marker: String,
    },
    /// Record stream size disagrees with the header checksum.
    Size {
        /// Byte size the header checksum promises.
        expected: u64,
        /// Byte size of the record stream on disk.
        actual: u64,
    },
    /// Declared record length disagrees with the extra-payload counts.
    RecordLength {
        /// Length declared by the header.
        declared: u32,
        /// Length implied by the extra-payload counts.
        derived: u32,
    },
}

impl fmt::Display for LayoutDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteOrder { marker } => {
                write!(f, "unsupported byte order marker {marker:?} (expected little endian)")
            }
            Self::Size { expected, actual } => {
                write!(f, "record stream holds {actual} bytes, header promises {expected}")
            }
            Self::RecordLength { declared, derived } => {
                write!(f, "record length {declared} does not match extra counts (implies {derived})")
            }
        }
    }
}
