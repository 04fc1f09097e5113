//! Messaging API client: sync HTTP via ureq, no tokio needed.
//!
//! Called from the blocking pool, next to the CPU-bound analysis. The
//! [`MessagingApi`] trait is the seam the webhook dispatcher depends on, so
//! dispatch can be tested with a recording mock.

use crate::config::LineConfig;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Largest image body accepted from the content endpoint.
const MAX_CONTENT_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("could not read response from {endpoint}: {reason}")]
    Body { endpoint: String, reason: String },
}

/// The two platform calls the bot makes.
pub trait MessagingApi: Send + Sync {
    /// Download the binary content of a message.
    fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, ApiError>;

    /// Answer a message with a single text bubble.
    fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Production client for the LINE Messaging API.
pub struct LineClient {
    agent: ureq::Agent,
    api_base: String,
    data_api_base: String,
    access_token: String,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to ApiError::Status below
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl LineClient {
    pub fn new(config: &LineConfig, access_token: impl Into<String>) -> Self {
        Self {
            agent: make_agent(Duration::from_secs(config.timeout_secs)),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            data_api_base: config.data_api_base.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn content_url(&self, message_id: &str) -> String {
        format!("{}/v2/bot/message/{}/content", self.data_api_base, message_id)
    }

    fn reply_url(&self) -> String {
        format!("{}/v2/bot/message/reply", self.api_base)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Turn a 4xx/5xx response into [`ApiError::Status`], keeping the body text.
fn check_status(
    endpoint: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<ureq::http::Response<ureq::Body>, ApiError> {
    let status = response.status().as_u16();
    if status >= 400 {
        let body = response.into_body().read_to_string().unwrap_or_default();
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }
    Ok(response)
}

impl MessagingApi for LineClient {
    fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, ApiError> {
        let endpoint = self.content_url(message_id);
        let response = self
            .agent
            .get(&endpoint)
            .header("Authorization", &self.bearer())
            .call()
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        let response = check_status(&endpoint, response)?;

        let mut body = response.into_body();
        body.with_config()
            .limit(MAX_CONTENT_BYTES)
            .read_to_vec()
            .map_err(|e| ApiError::Body {
                endpoint,
                reason: e.to_string(),
            })
    }

    fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), ApiError> {
        let endpoint = self.reply_url();
        let request = ReplyRequest {
            reply_token,
            messages: [TextMessage { kind: "text", text }],
        };
        let response = self
            .agent
            .post(&endpoint)
            .header("Authorization", &self.bearer())
            .send_json(&request)
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        check_status(&endpoint, response)?;
        Ok(())
    }
}
