//! Binarized view of the analysis grid.

use image::GrayImage;

/// Foreground/background grid derived from a grayscale image.
///
/// `true` marks a foreground (crack) cell. Cells are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl BinaryMask {
    /// Binarize with inverted polarity: samples strictly below `threshold`
    /// become foreground, samples at or above it background.
    pub fn from_gray(img: &GrayImage, threshold: u8) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            cells: img.pixels().map(|p| p.0[0] < threshold).collect(),
        }
    }

    /// Build a mask cell by cell.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub(crate) fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[(y * self.width + x) as usize]
    }

    /// Number of foreground cells.
    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Rows top to bottom.
    pub(crate) fn rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks(0) panics; an empty mask simply has no rows
        self.cells.chunks(self.width.max(1) as usize)
    }
}
