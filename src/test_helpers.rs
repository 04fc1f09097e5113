//! Shared test utilities for the crackscope test suite.
//!
//! Provides synthetic grayscale images with known box-counting behavior and
//! builders for signed webhook payloads.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let result = analyze_image(&uniform(512, 0), &AnalysisParams::default()).unwrap();
//! assert!((result.fractal_dimension - 2.0).abs() < 1e-9);
//!
//! let body = webhook_body(&[image_event("token-1", "msg-1")]);
//! let signature = SignatureVerifier::new("secret").sign(body.as_bytes());
//! ```

use image::{GrayImage, ImageEncoder, Luma};

// =========================================================================
// Synthetic images
// =========================================================================

/// Square image filled with one intensity.
pub fn uniform(size: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(size, size, Luma([value]))
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

/// White surface with a single one-pixel black row at `y`.
pub fn horizontal_line(size: u32, y: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |_, row| {
        if row == y { Luma([0]) } else { Luma([255]) }
    })
}

/// Losslessly encode as PNG.
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

// =========================================================================
// Webhook payloads
// =========================================================================

/// JSON for an image message event.
pub fn image_event(reply_token: &str, message_id: &str) -> String {
    format!(
        r#"{{"type":"message","mode":"active","timestamp":1700000000000,"source":{{"type":"user","userId":"U123"}},"replyToken":"{reply_token}","message":{{"type":"image","id":"{message_id}","contentProvider":{{"type":"line"}}}}}}"#
    )
}

/// JSON for a text message event.
pub fn text_event(reply_token: &str, text: &str) -> String {
    format!(
        r#"{{"type":"message","replyToken":"{reply_token}","message":{{"type":"text","id":"t1","text":"{text}"}}}}"#
    )
}

/// JSON for a follow event (no message).
pub fn follow_event(reply_token: &str) -> String {
    format!(r#"{{"type":"follow","replyToken":"{reply_token}","source":{{"type":"user","userId":"U123"}}}}"#)
}

/// Wrap events into a webhook body.
pub fn webhook_body(events: &[String]) -> String {
    format!(
        r#"{{"destination":"Ubot","events":[{}]}}"#,
        events.join(",")
    )
}
