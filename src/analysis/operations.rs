//! High-level analysis operations.
//!
//! These functions combine the decoder with the pure calculations: decode,
//! resample to the analysis grid, binarize, count boxes, fit, classify.

use super::backend::{AnalysisError, ImageDecoder};
use super::calculations::{BoxCountSample, box_counts, box_sizes, fractal_dimension};
use super::mask::BinaryMask;
use super::params::AnalysisParams;
use super::severity::Severity;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub fractal_dimension: f64,
    pub severity: Severity,
    /// The box counts the dimension was fitted to, smallest box first.
    pub samples: Vec<BoxCountSample>,
}

/// Analyze encoded image bytes.
pub fn analyze(
    decoder: &impl ImageDecoder,
    bytes: &[u8],
    params: &AnalysisParams,
) -> Result<AnalysisResult> {
    let gray = decoder.decode(bytes)?;
    analyze_image(&gray, params)
}

/// Analyze an image file.
pub fn analyze_path(
    decoder: &impl ImageDecoder,
    path: &Path,
    params: &AnalysisParams,
) -> Result<AnalysisResult> {
    let gray = decoder.decode_path(path)?;
    analyze_image(&gray, params)
}

/// Analyze an already decoded grayscale image.
pub fn analyze_image(gray: &GrayImage, params: &AnalysisParams) -> Result<AnalysisResult> {
    let sizes = box_sizes(params.resolution);
    if sizes.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            min_dim: params.resolution,
            sizes: sizes.len(),
        });
    }
    if gray.width() == 0 || gray.height() == 0 {
        return Err(AnalysisError::Decode("image has no pixels".into()));
    }

    let resized = resize_for_analysis(gray, params.resolution);
    let mask = BinaryMask::from_gray(&resized, params.threshold);
    let samples = box_counts(&mask, &sizes);
    let fractal_dimension = fractal_dimension(&samples)?;
    let severity = Severity::classify(fractal_dimension);

    debug!(
        source_width = gray.width(),
        source_height = gray.height(),
        foreground = mask.foreground_count(),
        ?samples,
        fractal_dimension,
        %severity,
        "analysis complete"
    );

    Ok(AnalysisResult {
        fractal_dimension,
        severity,
        samples,
    })
}

/// Resample to the square analysis grid with bilinear interpolation.
///
/// Each target pixel blends only the 2×2 source pixels around its centre,
/// at source coordinate `(d + 0.5) * scale - 0.5`. Shrinking therefore
/// samples rather than averages, so hairline cracks survive large
/// reductions. An image already at the target size is used as is, so
/// pre-resized input measures exactly like the original it was resized from.
pub fn resize_for_analysis(gray: &GrayImage, resolution: u32) -> Cow<'_, GrayImage> {
    if gray.dimensions() == (resolution, resolution) {
        Cow::Borrowed(gray)
    } else {
        Cow::Owned(resize_bilinear(gray, resolution, resolution))
    }
}

/// One output coordinate's two source taps and the weight of the second.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Taps {
    near: u32,
    far: u32,
    weight: f32,
}

fn taps(src: u32, dst: u32) -> Vec<Taps> {
    let scale = f64::from(src) / f64::from(dst);
    let last = src.saturating_sub(1);
    (0..dst)
        .map(|d| {
            let pos = ((f64::from(d) + 0.5) * scale - 0.5).max(0.0);
            let near = (pos.floor() as u32).min(last);
            let far = (near + 1).min(last);
            let weight = if far == near {
                0.0
            } else {
                (pos - pos.floor()) as f32
            };
            Taps { near, far, weight }
        })
        .collect()
}

fn resize_bilinear(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return GrayImage::new(width, height);
    }
    let xs = taps(gray.width(), width);
    let ys = taps(gray.height(), height);
    let sample = |x: u32, y: u32| f32::from(gray.get_pixel(x, y).0[0]);

    GrayImage::from_fn(width, height, |x, y| {
        let tx = xs[x as usize];
        let ty = ys[y as usize];
        let row = |y: u32| sample(tx.near, y) * (1.0 - tx.weight) + sample(tx.far, y) * tx.weight;
        let (top, bottom) = (row(ty.near), row(ty.far));
        let value = top * (1.0 - ty.weight) + bottom * ty.weight;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}
