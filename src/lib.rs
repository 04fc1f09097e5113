//! # crackscope
//!
//! Crack severity from a photo, answered in chat. A user sends a picture of
//! a wall or slab to the bot; the bot measures how much the dark crack
//! pattern fills the plane (its box-counting fractal dimension), turns that
//! into a severity, and replies.
//!
//! # Architecture
//!
//! ```text
//! POST /callback ─▶ verify signature ─▶ parse events
//!                                          │  (image message)
//!                                          ▼
//!                  fetch content ─▶ analyze ─▶ render ─▶ reply
//! ```
//!
//! Only `analyze` has real logic; everything around it is plumbing. The
//! analyzer is a pure function of the image bytes and the analysis
//! parameters: no I/O, no global state, safe to run on any thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`analysis`] | Decode, resample, binarize, box-count, fit, classify |
//! | [`config`] | `config.toml` loading, validation, merging; env secrets |
//! | [`line`] | Webhook signature check, event model, messaging API client |
//! | [`server`] | warp routes and per-event dispatch |
//! | [`output`] | Chat reply text and CLI result formatting |
//! | [`scan`] | File/directory expansion for the `analyze` command |
//!
//! # Design Decisions
//!
//! ## Box counting on a fixed square grid
//!
//! Every image is resampled to the same square power-of-two grid (512 by
//! default) before measuring, so box sizes 2, 4, ... 256 tile it exactly and
//! results are comparable across cameras and crops. The full-grid box size
//! is never sampled: it is occupied for any non-blank image and only
//! flattens the fit.
//!
//! ## Dark is foreground
//!
//! Cracks are darker than the surface around them, so the threshold is
//! inverted: intensities strictly below it are crack pixels.
//!
//! ## Blank images fail loudly
//!
//! A surface with no pixel below the threshold has zero occupied boxes at
//! every scale and no defined dimension. That is reported as
//! [`analysis::AnalysisError::Numeric`]; no NaN ever reaches the classifier
//! or the user.
//!
//! ## Typed errors in, text out
//!
//! The analyzer returns typed errors. Only the chat boundary
//! ([`server::handle_image`]) turns them into `❌ error: ...` replies.

pub mod analysis;
pub mod config;
pub mod line;
pub mod output;
pub mod scan;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;
