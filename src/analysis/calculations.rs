//! Pure calculation functions for box counting.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::AnalysisError;
use super::mask::BinaryMask;
use rayon::prelude::*;
use serde::Serialize;

/// Number of boxes of one size that contain at least one foreground cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxCountSample {
    pub box_size: u32,
    pub non_empty_boxes: u64,
}

/// Power-of-two box sizes sampled on a grid whose shorter edge is `min_dim`.
///
/// Exponents run from 1 up to, but excluding, `floor(log2(min_dim))`, so
/// the size that covers the whole grid in one box is never sampled.
///
/// # Examples
/// ```
/// # use crackscope::analysis::calculations::box_sizes;
/// assert_eq!(box_sizes(512), vec![2, 4, 8, 16, 32, 64, 128, 256]);
/// assert_eq!(box_sizes(8), vec![2, 4]);
/// assert!(box_sizes(3).is_empty());
/// ```
pub fn box_sizes(min_dim: u32) -> Vec<u32> {
    if min_dim < 2 {
        return Vec::new();
    }
    (1..min_dim.ilog2()).map(|e| 1u32 << e).collect()
}

/// Count the `k×k` boxes holding at least one foreground cell.
///
/// Boxes tile the mask from offset 0. When `k` does not divide an edge, the
/// trailing partial strip forms one more (smaller) box.
pub fn count_boxes(mask: &BinaryMask, k: u32) -> u64 {
    let k = k.max(1);
    let cols = mask.width().div_ceil(k) as usize;
    let rows = mask.height().div_ceil(k) as usize;
    let mut occupied = vec![false; cols * rows];

    for (y, row) in mask.rows().enumerate() {
        let base = (y / k as usize) * cols;
        for (x, _) in row.iter().enumerate().filter(|(_, fg)| **fg) {
            occupied[base + x / k as usize] = true;
        }
    }

    occupied.iter().filter(|&&o| o).count() as u64
}

/// Box counts for every size, in the order given. Sizes are counted in parallel.
pub fn box_counts(mask: &BinaryMask, sizes: &[u32]) -> Vec<BoxCountSample> {
    sizes
        .par_iter()
        .map(|&box_size| BoxCountSample {
            box_size,
            non_empty_boxes: count_boxes(mask, box_size),
        })
        .collect()
}

/// Least-squares line through `points`, as `(slope, intercept)`.
///
/// Returns `None` for fewer than two points or when every x is equal.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Box-counting dimension: the negated slope of `ln N(k)` against `ln k`.
///
/// A zero count anywhere fails: counts only grow as boxes shrink, so a zero
/// at one size means the mask is empty at every size.
pub fn fractal_dimension(samples: &[BoxCountSample]) -> Result<f64, AnalysisError> {
    if let Some(empty) = samples.iter().find(|s| s.non_empty_boxes == 0) {
        return Err(AnalysisError::Numeric(format!(
            "no foreground pixels at box size {} (image has no dark structure below the threshold)",
            empty.box_size
        )));
    }

    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (f64::from(s.box_size).ln(), (s.non_empty_boxes as f64).ln()))
        .collect();

    let (slope, _) = linear_fit(&points).ok_or_else(|| {
        AnalysisError::Numeric(format!(
            "need at least two distinct box sizes, got {}",
            samples.len()
        ))
    })?;

    let fd = -slope;
    if !fd.is_finite() {
        return Err(AnalysisError::Numeric(format!(
            "regression produced a non-finite slope ({slope})"
        )));
    }
    Ok(fd)
}
