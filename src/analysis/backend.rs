//! Image decoding seam and the analysis error type.
//!
//! The [`ImageDecoder`] trait is the one capability the analyzer consumes
//! from its environment: turn encoded bytes (or a file) into an 8-bit
//! grayscale grid. The production implementation is
//! [`RustDecoder`](super::rust_backend::RustDecoder).

use image::GrayImage;
use std::path::Path;
use thiserror::Error;

/// Everything that can go wrong inside a single analysis call.
///
/// Decoder-internal error types never escape; they are flattened into
/// [`AnalysisError::Decode`] with the decoder's message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error(
        "image too small for box counting: a {min_dim}px grid gives {sizes} box size(s), at least 2 are needed"
    )]
    InsufficientData { min_dim: u32, sizes: usize },
    #[error("degenerate box counts: {0}")]
    Numeric(String),
}

/// Decodes raw image data into single-channel grayscale.
pub trait ImageDecoder: Sync {
    /// Decode encoded bytes (JPEG, PNG, ...).
    fn decode(&self, bytes: &[u8]) -> Result<GrayImage, AnalysisError>;

    /// Read a file and decode it.
    fn decode_path(&self, path: &Path) -> Result<GrayImage, AnalysisError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AnalysisError::Decode(format!("{}: {e}", path.display())))?;
        self.decode(&bytes)
    }
}
