//! Crack analysis: box-counting fractal dimension of dark structures.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (guessed format) → `to_luma8` |
//! | **Resize** | two-tap bilinear sampling, see [`resize_for_analysis`] |
//! | **Binarize** | inverted global threshold, see [`BinaryMask::from_gray`] |
//! | **Box counting** | [`calculations::box_counts`], one rayon task per box size |
//! | **Fit** | least squares over `(ln k, ln N(k))` |
//! | **Classify** | [`Severity::classify`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for box sizes, box counts and the fit (unit testable)
//! - **Parameters**: Analysis resolution and threshold
//! - **Backend**: [`ImageDecoder`] trait + [`RustDecoder`]
//! - **Operations**: [`analyze`] and friends, combining decoder + calculations
//!
//! Nothing here touches the network or global state; every call depends only
//! on its input, so the analyzer can run on any number of threads at once.

pub mod backend;
pub mod calculations;
mod mask;
pub mod operations;
mod params;
pub mod rust_backend;
mod severity;

pub use backend::{AnalysisError, ImageDecoder};
pub use calculations::BoxCountSample;
pub use mask::BinaryMask;
pub use operations::{AnalysisResult, analyze, analyze_image, analyze_path, resize_for_analysis};
pub use params::{AnalysisParams, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD};
pub use rust_backend::{RustDecoder, supported_input_extensions};
pub use severity::Severity;
