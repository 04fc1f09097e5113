//! Webhook body model.
//!
//! Only what the bot acts on is modelled: message events carrying an image.
//! Every other event or message type deserializes into an `Other` variant so
//! new platform event kinds never make a valid webhook fail to parse.

use serde::Deserialize;

/// Top-level webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Message {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        message: Message,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Image { id: String },
    #[serde(other)]
    Other,
}

/// An image the bot should analyze and answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRequest<'a> {
    pub reply_token: &'a str,
    pub message_id: &'a str,
}

impl WebhookPayload {
    /// Image message events that can be replied to, in delivery order.
    pub fn image_requests(&self) -> impl Iterator<Item = ImageRequest<'_>> {
        self.events.iter().filter_map(|event| match event {
            Event::Message {
                reply_token: Some(reply_token),
                message: Message::Image { id },
            } => Some(ImageRequest {
                reply_token,
                message_id: id,
            }),
            _ => None,
        })
    }
}
