//! LINE Messaging API plumbing.
//!
//! | Concern | Module |
//! |---|---|
//! | `X-Line-Signature` check (HMAC-SHA256, base64) | [`signature`] |
//! | Webhook body model | [`events`] |
//! | Content download + reply (sync HTTP via `ureq`) | [`client`] |
//!
//! None of this is needed to analyze an image; the analyzer never sees any
//! of these types.

pub mod client;
pub mod events;
pub mod signature;

pub use client::{ApiError, LineClient, MessagingApi};
pub use events::{Event, ImageRequest, Message, WebhookPayload};
pub use signature::SignatureVerifier;
