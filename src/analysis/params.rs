//! Parameter types for an analysis run.
//!
//! These describe *how* an image is measured: the square grid it is resampled
//! to and the intensity cutoff that separates crack from surface. They are
//! built from the `[analysis]` config section
//! (see [`AnalysisConfig::params`](crate::config::AnalysisConfig::params)).

/// Edge length of the square analysis grid.
pub const DEFAULT_RESOLUTION: u32 = 512;

/// Samples strictly below this intensity count as crack pixels.
pub const DEFAULT_THRESHOLD: u8 = 127;

/// Resolution and threshold for one analysis call.
///
/// Not validated on construction: a resolution that yields fewer than two box
/// sizes is reported as
/// [`AnalysisError::InsufficientData`](super::AnalysisError::InsufficientData)
/// when the analysis runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParams {
    pub resolution: u32,
    pub threshold: u8,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}
