//! Counting record writer with deferred header commit.
//!
//! Records are appended to the `.IAEAphsp` stream as they arrive; the
//! `.IAEAheader` artifact is derived from the running count and written only
//! at [`PhspWriter::commit_header`]. A failed commit therefore never touches
//! record data that is already on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PhspError, Result};
use crate::header::{record_path, PhspHeader};
use crate::reader::PhspReader;
use crate::record::Record;

/// Write half of one dataset.
#[derive(Debug)]
pub struct PhspWriter {
    header: PhspHeader,
    stream: BufWriter<File>,
    base: PathBuf,
    written: u64,
    buf: Vec<u8>,
}

impl PhspWriter {
    /// Create (or truncate) the record stream for the dataset at `base`.
    ///
    /// Starts from a fresh header with no extra payload; usually followed by
    /// [`Self::copy_header_from`] and [`Self::set_extra_counts`].
    pub fn create(base: &Path) -> Result<Self> {
        let path = record_path(base);
        let file = File::create(&path).map_err(|source| PhspError::Open { path, source })?;
        Ok(Self {
            header: PhspHeader::new(0, 0),
            stream: BufWriter::new(file),
            base: base.to_owned(),
            written: 0,
            buf: Vec::new(),
        })
    }

    /// Take over the source header (title, payload shape, pass-through
    /// sections). Counts and checksum are zeroed; they are derived from what
    /// actually gets written.
    ///
    /// Refused once records have been written, because the payload shape
    /// fixes the record length of the whole stream.
    pub fn copy_header_from(&mut self, src: &PhspReader) -> Result<()> {
        if self.written != 0 {
            return Err(PhspError::HeaderCopy {
                reason: format!("{} records already written", self.written),
            });
        }
        self.header = src.header().clone();
        self.header.particle_count = 0;
        self.header.original_histories = 0;
        self.header.checksum = 0;
        Ok(())
    }

    /// Configure the extra-payload shape of the output records.
    ///
    /// Takes effect for subsequently written records; callers configure this
    /// while opening the dataset, before the first record.
    pub fn set_extra_counts(&mut self, extra_floats: u32, extra_longs: u32) {
        self.header.extra_floats = extra_floats;
        self.header.extra_longs = extra_longs;
        self.header.record_length = self.header.derived_record_length();
    }

    /// Append one record, re-encoded to this writer's payload shape.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.buf.clear();
        record.encode_into(&mut self.buf, self.header.extra_floats, self.header.extra_longs);
        self.stream.write_all(&self.buf)?;
        self.written += 1;
        Ok(())
    }

    /// Records appended so far.
    #[must_use]
    pub const fn records_written(&self) -> u64 {
        self.written
    }

    /// Pending output header (as it would be committed right now).
    #[must_use]
    pub const fn header(&self) -> &PhspHeader {
        &self.header
    }

    /// Set the original-histories statistic of the pending header.
    pub fn set_original_histories(&mut self, histories: u64) {
        self.header.original_histories = histories;
    }

    /// Flush the record stream and write the header artifact with counts and
    /// checksum recomputed from what was actually written.
    pub fn commit_header(&mut self) -> Result<()> {
        self.stream.flush().map_err(|source| PhspError::HeaderUpdate {
            path: record_path(&self.base),
            source,
        })?;
        self.header.particle_count = self.written;
        self.header.record_length = self.header.derived_record_length();
        self.header.checksum = self.header.derived_checksum();
        self.header.write_to(&self.base)?;
        debug!(
            particles = self.header.particle_count,
            checksum = self.header.checksum,
            "committed output header"
        );
        Ok(())
    }
}
