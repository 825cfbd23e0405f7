//! Fixed-layout binary record codec.
//!
//! One record is one particle crossing event. The wire layout is little
//! endian and self-contained:
//!
//! | offset | field |
//! |-------:|-------|
//! | 0      | `i8` kind code; negative marks the first particle of a new history |
//! | 1      | `f32` energy (MeV) |
//! | 5      | `f32` statistical weight |
//! | 9..21  | `f32` x, y, z (cm) |
//! | 21..33 | `f32` u, v, w (direction cosines) |
//! | 33..   | extra payload: nf × `f32`, then nl × `i32` |
//!
//! Decoding yields a tagged [`Decoded`] result rather than a sentinel status
//! inside the record, so control flow never leaks into the data shape. A
//! defective slot still consumes its full fixed size; the stream stays
//! aligned for the next slot.

use std::fmt;

/// Byte size of a record with no extra payload.
pub const BASE_RECORD_LENGTH: u32 = 33;

/// Direction cosines must satisfy `u² + v² + w² ≈ 1` within this tolerance.
pub const DIRECTION_NORM_TOLERANCE: f32 = 1e-2;

/// Byte size of a record slot for the given extra-payload counts.
#[inline]
#[must_use]
pub const fn record_length(extra_floats: u32, extra_longs: u32) -> u32 {
    BASE_RECORD_LENGTH + 4 * extra_floats + 4 * extra_longs
}

/// Particle species carried by the stream (wire codes 1..=5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ParticleKind {
    /// Photon (code 1).
    Photon = 1,
    /// Electron (code 2).
    Electron = 2,
    /// Positron (code 3).
    Positron = 3,
    /// Neutron (code 4).
    Neutron = 4,
    /// Proton (code 5).
    Proton = 5,
}

impl ParticleKind {
    /// Map a wire code (sign already stripped) to a kind.
    #[inline]
    #[must_use]
    pub const fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Self::Photon),
            2 => Some(Self::Electron),
            3 => Some(Self::Positron),
            4 => Some(Self::Neutron),
            5 => Some(Self::Proton),
            _ => None,
        }
    }

    /// The positive wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }
}

/// One particle crossing event.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Particle species.
    pub kind: ParticleKind,
    /// Whether this particle starts a new primary history.
    pub new_history: bool,
    /// Kinetic energy in MeV (finite, non-negative).
    pub energy: f32,
    /// Statistical weight (finite, non-negative).
    pub weight: f32,
    /// Position, x component (cm).
    pub x: f32,
    /// Position, y component (cm).
    pub y: f32,
    /// Position on the transport axis (cm).
    pub z: f32,
    /// Direction cosine along x.
    pub u: f32,
    /// Direction cosine along y.
    pub v: f32,
    /// Direction cosine along the transport axis.
    pub w: f32,
    /// Extra float payload (shape fixed per dataset, opaque here).
    pub extra_floats: Vec<f32>,
    /// Extra integer payload (shape fixed per dataset, opaque here).
    pub extra_longs: Vec<i32>,
}

impl Record {
    /// Position as a `(x, y, z)` triple.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    /// Direction cosines as a `(u, v, w)` triple.
    #[inline]
    #[must_use]
    pub const fn direction(&self) -> (f32, f32, f32) {
        (self.u, self.v, self.w)
    }

    /// Append the wire encoding for a slot with `nf`/`nl` extra fields.
    ///
    /// The extra payload is truncated or zero-padded to the requested shape;
    /// every other field is written exactly as held.
    pub fn encode_into(&self, buf: &mut Vec<u8>, nf: u32, nl: u32) {
        let code = if self.new_history { -self.kind.code() } else { self.kind.code() };
        buf.push(code as u8);
        buf.extend_from_slice(&self.energy.to_le_bytes());
        buf.extend_from_slice(&self.weight.to_le_bytes());
        for field in [self.x, self.y, self.z, self.u, self.v, self.w] {
            buf.extend_from_slice(&field.to_le_bytes());
        }
        for i in 0..nf as usize {
            let value = self.extra_floats.get(i).copied().unwrap_or(0.0);
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for i in 0..nl as usize {
            let value = self.extra_longs.get(i).copied().unwrap_or(0);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Decode one full slot of `record_length(nf, nl)` bytes.
    ///
    /// Returns [`Decoded::Malformed`] for slots whose contents cannot be a
    /// particle; the caller decides how many of those to tolerate.
    #[must_use]
    pub fn decode(slot: &[u8], nf: u32, nl: u32) -> Decoded {
        debug_assert_eq!(slot.len(), record_length(nf, nl) as usize);

        let raw_code = slot[0] as i8;
        let Some(kind) = ParticleKind::from_code(raw_code.unsigned_abs() as i8) else {
            return Decoded::Malformed(RecordDefect::UnknownKind(raw_code));
        };
        let new_history = raw_code < 0;

        let energy = read_f32(slot, 1);
        let weight = read_f32(slot, 5);
        let x = read_f32(slot, 9);
        let y = read_f32(slot, 13);
        let z = read_f32(slot, 17);
        let u = read_f32(slot, 21);
        let v = read_f32(slot, 25);
        let w = read_f32(slot, 29);

        for (name, value) in [
            ("energy", energy),
            ("weight", weight),
            ("x", x),
            ("y", y),
            ("z", z),
            ("u", u),
            ("v", v),
            ("w", w),
        ] {
            if !value.is_finite() {
                return Decoded::Malformed(RecordDefect::NonFinite(name));
            }
        }
        if energy < 0.0 {
            return Decoded::Malformed(RecordDefect::NegativeEnergy);
        }
        if weight < 0.0 {
            return Decoded::Malformed(RecordDefect::NegativeWeight);
        }
        let norm = u * u + v * v + w * w;
        if (norm - 1.0).abs() > DIRECTION_NORM_TOLERANCE {
            return Decoded::Malformed(RecordDefect::SkewDirection);
        }

        let mut off = BASE_RECORD_LENGTH as usize;
        let mut extra_floats = Vec::with_capacity(nf as usize);
        for _ in 0..nf {
            extra_floats.push(read_f32(slot, off));
            off += 4;
        }
        let mut extra_longs = Vec::with_capacity(nl as usize);
        for _ in 0..nl {
            extra_longs.push(read_i32(slot, off));
            off += 4;
        }

        Decoded::Record(Record {
            kind,
            new_history,
            energy,
            weight,
            x,
            y,
            z,
            u,
            v,
            w,
            extra_floats,
            extra_longs,
        })
    }
}

/// Outcome of decoding one record slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// The slot held a well-formed particle.
    Record(Record),
    /// The slot was consumed but its contents are not a particle.
    Malformed(RecordDefect),
}

/// Why a record slot failed to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordDefect {
    /// The kind byte is zero or outside the known codes.
    UnknownKind(i8),
    /// A float field is NaN or infinite; carries the field name.
    NonFinite(&'static str),
    /// Energy below zero.
    NegativeEnergy,
    /// Weight below zero.
    NegativeWeight,
    /// Direction cosines are far from unit norm.
    SkewDirection,
}

impl fmt::Display for RecordDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(code) => write!(f, "unknown particle kind code {code}"),
            Self::NonFinite(field) => write!(f, "non-finite {field}"),
            Self::NegativeEnergy => write!(f, "negative energy"),
            Self::NegativeWeight => write!(f, "negative weight"),
            Self::SkewDirection => write!(f, "direction cosines are not unit norm"),
        }
    }
}

#[inline]
fn read_f32(slot: &[u8], off: usize) -> f32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&slot[off..off + 4]);
    f32::from_le_bytes(bytes)
}

#[inline]
fn read_i32(slot: &[u8], off: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&slot[off..off + 4]);
    i32::from_le_bytes(bytes)
}
