//! Immutable per-run configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Acceptance;

/// Everything one filtering pass needs to know up front.
///
/// Built once, handed to [`crate::FilterPipeline::new`], never mutated during
/// a run; independent runs can therefore carry different geometries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Projection plane and transverse window.
    pub acceptance: Acceptance,
    /// Pass aborts once strictly more than this many records failed to
    /// decode.
    pub error_threshold: u64,
    /// Emit a progress line every this many processed records.
    pub progress_interval: u64,
    /// Drop the extra payload from output records (the usual choice: the
    /// payload is opaque to the cut and inflates the output).
    pub strip_extras: bool,
    /// Treat any header/stream size inconsistency as fatal instead of
    /// warning and continuing.
    pub strict_layout: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            acceptance: Acceptance::default(),
            error_threshold: 100,
            progress_interval: 1_000_000,
            strip_extras: true,
            strict_layout: false,
        }
    }
}

impl FilterConfig {
    /// Reject configurations that cannot describe a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.acceptance;
        if a.x_min > a.x_max {
            return Err(ConfigError::InvertedBounds { axis: 'x', min: a.x_min, max: a.x_max });
        }
        if a.y_min > a.y_max {
            return Err(ConfigError::InvertedBounds { axis: 'y', min: a.y_min, max: a.y_max });
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }
        Ok(())
    }
}

/// Ways a [`FilterConfig`] can be unusable.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A window bound pair is inverted.
    #[error("{axis} bounds are inverted: [{min}, {max}]")]
    InvertedBounds {
        /// Which transverse axis.
        axis: char,
        /// Lower bound as given.
        min: f32,
        /// Upper bound as given.
        max: f32,
    },
    /// The progress interval must be positive.
    #[error("progress interval must be positive")]
    ZeroProgressInterval,
}
