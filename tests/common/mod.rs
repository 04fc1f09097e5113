//! Synthetic images with known box-counting behavior.
//!
//! Integration tests link the library built without `cfg(test)`, so the
//! crate's own `test_helpers` are not visible here. These builders cover the
//! same shapes plus the rectangular, JPEG and branching-crack fixtures only
//! the end-to-end tests need.

#![allow(dead_code)]

use image::{GrayImage, ImageEncoder, Luma};

pub fn uniform(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Black/white checkerboard repeating every `period` pixels.
pub fn checkerboard(size: u32, period: u32) -> GrayImage {
    let half = (period / 2).max(1);
    GrayImage::from_fn(size, size, |x, y| {
        if ((x / half) + (y / half)) % 2 == 0 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Left-to-right ramp from 0 to 255.
pub fn horizontal_gradient(size: u32) -> GrayImage {
    let last = size.saturating_sub(1).max(1);
    GrayImage::from_fn(size, size, |x, _| Luma([(x * 255 / last) as u8]))
}

/// Light surface with a dark branching crack: a diagonal trunk plus two
/// shorter branches, each a few pixels wide.
pub fn branching_crack(size: u32) -> GrayImage {
    let s = size as i64;
    GrayImage::from_fn(size, size, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let trunk = (x - y).abs() <= 2;
        let branch_a = x < s / 2 && ((s - x) - (y + s / 4)).abs() <= 1;
        let branch_b = y > s / 2 && (x - (s - y) / 2).abs() <= 1;
        if trunk || branch_a || branch_b {
            Luma([20])
        } else {
            Luma([210])
        }
    })
}

pub fn png_bytes(img: &GrayImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .unwrap();
    out
}

pub fn jpeg_bytes(img: &GrayImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .unwrap();
    out
}
