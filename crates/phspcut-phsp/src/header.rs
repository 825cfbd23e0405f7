//! ASCII header codec for `<base>.IAEAheader` artifacts.
//!
//! Headers are line-oriented: a section opens with `$KEY:` on its own line
//! and its value is every following line up to the next section. Only the
//! sections this tool touches are interpreted; everything else is preserved
//! in order so a copied header keeps upstream metadata intact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LayoutDefect, PhspError, Result};
use crate::record::record_length;

/// Suffix of the ASCII header artifact.
pub const HEADER_SUFFIX: &str = ".IAEAheader";
/// Suffix of the binary record-stream artifact.
pub const RECORD_SUFFIX: &str = ".IAEAphsp";
/// Upper bound on either extra-payload count.
pub const MAX_EXTRA: u32 = 10;

/// Byte-order marker carried in the `$BYTE_ORDER` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Marker `1234`, the only order this tool reads and writes.
    Little,
    /// Marker `4321`, recognized so the mismatch can be reported cleanly.
    Big,
}

impl ByteOrder {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "1234" => Some(Self::Little),
            "4321" => Some(Self::Big),
            _ => None,
        }
    }

    /// The wire marker for this order.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Little => "1234",
            Self::Big => "4321",
        }
    }
}

/// Parsed header of one dataset.
///
/// Holds the fields the filtering pass must read or rewrite; unknown
/// sections ride along untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct PhspHeader {
    /// Free-text `$TITLE` section.
    pub title: String,
    /// Byte order of the record stream.
    pub byte_order: ByteOrder,
    /// Declared byte size of one record slot.
    pub record_length: u32,
    /// Declared number of records (`$PARTICLES`). Legacy producers are known
    /// to overstate this by exactly one.
    pub particle_count: u64,
    /// Number of primary histories the records were sampled from.
    pub original_histories: u64,
    /// Extra float fields per record.
    pub extra_floats: u32,
    /// Extra integer fields per record.
    pub extra_longs: u32,
    /// Expected byte size of the record stream
    /// (`record_length * particle_count`).
    pub checksum: u64,
    /// Sections this tool does not interpret, preserved in order.
    pub extra_sections: Vec<(String, String)>,
}

impl PhspHeader {
    /// Fresh header for a dataset about to be written.
    #[must_use]
    pub fn new(extra_floats: u32, extra_longs: u32) -> Self {
        Self {
            title: String::new(),
            byte_order: ByteOrder::Little,
            record_length: record_length(extra_floats, extra_longs),
            particle_count: 0,
            original_histories: 0,
            extra_floats,
            extra_longs,
            checksum: 0,
            extra_sections: Vec::new(),
        }
    }

    /// Record length implied by the extra-payload counts.
    #[inline]
    #[must_use]
    pub const fn derived_record_length(&self) -> u32 {
        record_length(self.extra_floats, self.extra_longs)
    }

    /// Checksum implied by the record length and particle count.
    #[inline]
    #[must_use]
    pub const fn derived_checksum(&self) -> u64 {
        self.record_length as u64 * self.particle_count
    }

    /// Parse header text.
    pub fn parse(text: &str) -> Result<Self> {
        let sections = split_sections(text);

        let mut title = String::new();
        let mut byte_order = None;
        let mut declared_length = None;
        let mut particle_count = None;
        let mut original_histories = 0u64;
        let mut extra_floats = 0u32;
        let mut extra_longs = 0u32;
        let mut checksum = None;
        let mut extra_sections = Vec::new();

        for (key, value) in sections {
            match key.as_str() {
                "TITLE" => title = value,
                "BYTE_ORDER" => {
                    byte_order = Some(ByteOrder::from_marker(value.trim()).ok_or_else(|| {
                        PhspError::HeaderParse {
                            reason: format!("unrecognized $BYTE_ORDER marker {:?}", value.trim()),
                        }
                    })?);
                }
                "RECORD_LENGTH" => declared_length = Some(parse_int::<u32>(&key, &value)?),
                "PARTICLES" => particle_count = Some(parse_int::<u64>(&key, &value)?),
                "ORIG_HISTORIES" => original_histories = parse_int(&key, &value)?,
                "EXTRA_FLOATS" => extra_floats = parse_int(&key, &value)?,
                "EXTRA_LONGS" => extra_longs = parse_int(&key, &value)?,
                "CHECKSUM" => checksum = Some(parse_int::<u64>(&key, &value)?),
                _ => extra_sections.push((key, value)),
            }
        }

        let byte_order = byte_order.ok_or_else(|| missing("BYTE_ORDER"))?;
        let declared_length = declared_length.ok_or_else(|| missing("RECORD_LENGTH"))?;
        let particle_count = particle_count.ok_or_else(|| missing("PARTICLES"))?;
        let checksum = checksum.ok_or_else(|| missing("CHECKSUM"))?;

        if extra_floats > MAX_EXTRA || extra_longs > MAX_EXTRA {
            return Err(PhspError::HeaderParse {
                reason: format!(
                    "extra-payload counts ({extra_floats}, {extra_longs}) exceed the limit of {MAX_EXTRA}"
                ),
            });
        }
        let derived = record_length(extra_floats, extra_longs);
        if declared_length != derived {
            return Err(PhspError::FormatMismatch(LayoutDefect::RecordLength {
                declared: declared_length,
                derived,
            }));
        }

        Ok(Self {
            title,
            byte_order,
            record_length: declared_length,
            particle_count,
            original_histories,
            extra_floats,
            extra_longs,
            checksum,
            extra_sections,
        })
    }

    /// Render the header back to its ASCII form.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_section(&mut out, "TITLE", &self.title);
        push_section(&mut out, "BYTE_ORDER", self.byte_order.marker());
        push_section(&mut out, "RECORD_LENGTH", &self.record_length.to_string());
        push_section(&mut out, "PARTICLES", &self.particle_count.to_string());
        push_section(&mut out, "ORIG_HISTORIES", &self.original_histories.to_string());
        push_section(&mut out, "EXTRA_FLOATS", &self.extra_floats.to_string());
        push_section(&mut out, "EXTRA_LONGS", &self.extra_longs.to_string());
        push_section(&mut out, "CHECKSUM", &self.checksum.to_string());
        for (key, value) in &self.extra_sections {
            push_section(&mut out, key, value);
        }
        out
    }

    /// Read and parse the header artifact for `base`.
    pub fn read_from(base: &Path) -> Result<Self> {
        let path = header_path(base);
        let text = fs::read_to_string(&path).map_err(|source| PhspError::Open { path, source })?;
        Self::parse(&text)
    }

    /// Write the header artifact for `base`.
    pub fn write_to(&self, base: &Path) -> Result<()> {
        let path = header_path(base);
        fs::write(&path, self.render()).map_err(|source| PhspError::HeaderUpdate { path, source })
    }
}

/// Path of the header artifact for a dataset base path.
#[must_use]
pub fn header_path(base: &Path) -> PathBuf {
    with_suffix(base, HEADER_SUFFIX)
}

/// Path of the record-stream artifact for a dataset base path.
#[must_use]
pub fn record_path(base: &Path) -> PathBuf {
    with_suffix(base, RECORD_SUFFIX)
}

/// Delete both artifacts of a dataset if they exist.
pub fn remove_dataset(base: &Path) -> std::io::Result<()> {
    for path in [header_path(base), record_path(base)] {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn split_sections(text: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for raw in text.lines() {
        let line = raw.trim_end();
        if let Some(rest) = line.strip_prefix('$') {
            if let Some(colon) = rest.find(':') {
                if let Some((key, lines)) = current.take() {
                    sections.push((key, finish_value(lines)));
                }
                let mut lines = Vec::new();
                let inline = rest[colon + 1..].trim();
                if !inline.is_empty() {
                    lines.push(inline.to_owned());
                }
                current = Some((rest[..colon].trim().to_owned(), lines));
                continue;
            }
        }
        if let Some((_, lines)) = current.as_mut() {
            lines.push(line.to_owned());
        }
        // Text before the first section is ignored.
    }
    if let Some((key, lines)) = current {
        sections.push((key, finish_value(lines)));
    }
    sections
}

fn finish_value(lines: Vec<String>) -> String {
    lines.join("\n").trim().to_owned()
}

fn push_section(out: &mut String, key: &str, value: &str) {
    out.push('$');
    out.push_str(key);
    out.push_str(":\n");
    if !value.is_empty() {
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| PhspError::HeaderParse {
            reason: format!("${key} holds {value:?}, expected an integer"),
        })
}

fn missing(key: &str) -> PhspError {
    PhspError::HeaderParse {
        reason: format!("missing ${key} section"),
    }
}
