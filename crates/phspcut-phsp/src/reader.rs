//! Streaming record reader.
//!
//! One record slot is materialized at a time; the reader owns its file
//! handle and scratch buffer so iteration has no lifetime pitfalls and no
//! per-record allocation.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LayoutDefect, PhspError, Result};
use crate::header::{record_path, ByteOrder, PhspHeader};
use crate::record::{Decoded, Record};

/// Read half of one dataset: parsed header plus the open record stream.
#[derive(Debug)]
pub struct PhspReader {
    header: PhspHeader,
    stream: BufReader<File>,
    record_path: PathBuf,
    slot: Vec<u8>,
    records_read: u64,
}

impl PhspReader {
    /// Open both artifacts of the dataset at `base`.
    ///
    /// Parses the header and opens the record stream; neither byte-order nor
    /// size consistency is checked here, see [`Self::validate_layout`].
    pub fn open(base: &Path) -> Result<Self> {
        let header = PhspHeader::read_from(base)?;
        let record_path = record_path(base);
        let file = File::open(&record_path).map_err(|source| PhspError::Open {
            path: record_path.clone(),
            source,
        })?;
        let slot = vec![0u8; header.record_length as usize];
        Ok(Self {
            header,
            stream: BufReader::new(file),
            record_path,
            slot,
            records_read: 0,
        })
    }

    /// The parsed input header.
    #[must_use]
    pub const fn header(&self) -> &PhspHeader {
        &self.header
    }

    /// Raw `$PARTICLES` value. Legacy producers are known to overstate the
    /// readable count by exactly one; callers must not treat reading one
    /// fewer record than this as an error.
    #[must_use]
    pub const fn declared_record_count(&self) -> u64 {
        self.header.particle_count
    }

    /// Extra-payload shape of this dataset.
    #[must_use]
    pub const fn extra_counts(&self) -> (u32, u32) {
        (self.header.extra_floats, self.header.extra_longs)
    }

    /// Check byte order and stream size against the header.
    ///
    /// The byte-order marker must be little endian in either mode. For the
    /// size: an exact match passes; a shortfall of exactly one record passes
    /// quietly (the usual overstatement by legacy producers); any other
    /// inconsistency fails in `strict` mode and is downgraded to a warning
    /// otherwise.
    pub fn validate_layout(&self, strict: bool) -> Result<()> {
        if self.header.byte_order != ByteOrder::Little {
            return Err(PhspError::FormatMismatch(LayoutDefect::ByteOrder {
                marker: self.header.byte_order.marker().to_owned(),
            }));
        }

        let actual = fs::metadata(&self.record_path)?.len();
        let expected = self.header.checksum;
        if actual == expected {
            return Ok(());
        }
        let one_record = u64::from(self.header.record_length);
        if expected >= one_record && actual == expected - one_record {
            debug!(expected, actual, "header declares one record more than the stream holds");
            return Ok(());
        }

        let defect = LayoutDefect::Size { expected, actual };
        if strict {
            return Err(PhspError::FormatMismatch(defect));
        }
        warn!(%defect, "tolerating record-stream size mismatch");
        Ok(())
    }

    /// Read the next record slot.
    ///
    /// Returns `Ok(None)` at a clean end of stream. A slot that decodes to
    /// garbage comes back as [`Decoded::Malformed`]; a slot cut short by the
    /// end of the file is a hard [`PhspError::TruncatedRecord`].
    pub fn read_record(&mut self) -> Result<Option<Decoded>> {
        let want = self.slot.len();
        let mut filled = 0usize;
        while filled < want {
            let n = self.stream.read(&mut self.slot[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < want {
            return Err(PhspError::TruncatedRecord {
                index: self.records_read,
                got: filled,
                want,
            });
        }
        self.records_read += 1;
        Ok(Some(Record::decode(
            &self.slot,
            self.header.extra_floats,
            self.header.extra_longs,
        )))
    }

    /// Number of full slots consumed so far.
    #[must_use]
    pub const fn records_read(&self) -> u64 {
        self.records_read
    }
}
