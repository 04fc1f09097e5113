//! Pure Rust decoder built on the `image` crate.
//!
//! | Format | Decoder |
//! |---|---|
//! | JPEG (what the chat platform delivers) | `image` crate, `jpeg` feature |
//! | PNG, TIFF, WebP (local `analyze` runs) | `image` crate |
//!
//! Colour input is reduced to luma with `DynamicImage::to_luma8`.

use super::backend::{AnalysisError, ImageDecoder};
use image::{GrayImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Lower-case file extensions the decoder can read.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustDecoder;

impl RustDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for RustDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<GrayImage, AnalysisError> {
        // Format is sniffed from the magic bytes; the platform gives no filename.
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(AnalysisError::Decode("unrecognized image format".into()));
        }
        let img = reader
            .decode()
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        Ok(img.to_luma8())
    }
}
