//! Severity buckets for a fractal dimension.
//!
//! | fd | Severity |
//! |---|---|
//! | below 1.2 | Minor |
//! | 1.2 up to 1.5 | Moderate |
//! | 1.5 and above | Severe |

use serde::Serialize;
use std::fmt;

/// Crack severity derived from the fractal dimension.
///
/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    /// Lower bound (inclusive) of [`Severity::Moderate`].
    pub const MODERATE_FROM: f64 = 1.2;
    /// Lower bound (inclusive) of [`Severity::Severe`].
    pub const SEVERE_FROM: f64 = 1.5;

    /// Map a fractal dimension to a severity.
    ///
    /// | fd | severity |
    /// |---|---|
    /// | `< 1.2` | Minor |
    /// | `1.2 ..< 1.5` | Moderate |
    /// | `>= 1.5` | Severe |
    ///
    /// Boundary values land in the higher bucket. NaN falls through to
    /// `Severe`, the catch-all, so every input gets exactly one label.
    pub fn classify(fd: f64) -> Self {
        if fd < Self::MODERATE_FROM {
            Severity::Minor
        } else if fd < Self::SEVERE_FROM {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
