//! Webhook server.
//!
//! | Route | Behavior |
//! |---|---|
//! | `GET /` | Liveness text |
//! | `POST /callback` | Verify signature → parse events → analyze images → reply |
//!
//! A request whose signature does not verify (or whose verified body is not
//! a webhook payload) gets `400` and never reaches the analyzer. Everything
//! after verification is answered with `200`: analysis and delivery
//! failures are reported to the chat user or logged, not to the platform,
//! which would otherwise redeliver the event.
//!
//! Bodies are capped at [`MAX_WEBHOOK_BYTES`] by their `Content-Length`
//! before anything is buffered: larger ones get `413`, and a body without a
//! length gets `411`.
//!
//! Routes are warp filters. Analysis is CPU-bound and the messaging client
//! is synchronous, so each webhook's events are dispatched on tokio's
//! blocking pool.

use crate::analysis::{AnalysisParams, RustDecoder, analyze};
use crate::config::{BotConfig, Secrets};
use crate::line::{ImageRequest, LineClient, MessagingApi, SignatureVerifier, WebhookPayload};
use crate::output;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use warp::Filter;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

pub const SIGNATURE_HEADER: &str = "x-line-signature";
pub const LIVENESS_TEXT: &str = "crackscope is running.";
/// Largest webhook body accepted; larger requests get 413 before buffering.
pub const MAX_WEBHOOK_BYTES: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("missing X-Line-Signature header")]
    MissingSignature,
    #[error("signature does not match body")]
    InvalidSignature,
    #[error("malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },
    #[error("{0} resolved to no addresses")]
    NoAddress(String),
    #[error("could not bind: {0}")]
    Bind(#[from] warp::Error),
}

/// Everything a webhook needs, built once at startup.
pub struct AppState {
    pub verifier: SignatureVerifier,
    pub api: Arc<dyn MessagingApi>,
    pub decoder: RustDecoder,
    pub params: AnalysisParams,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        verifier: SignatureVerifier,
        api: Arc<dyn MessagingApi>,
        params: AnalysisParams,
    ) -> Self {
        Self {
            verifier,
            api,
            decoder: RustDecoder::new(),
            params,
        }
    }

    pub fn from_config(config: &BotConfig, secrets: &Secrets) -> Self {
        Self::new(
            SignatureVerifier::new(secrets.channel_secret.as_bytes()),
            Arc::new(LineClient::new(
                &config.line,
                secrets.channel_access_token.clone(),
            )),
            config.analysis.params(),
        )
    }
}

/// `GET /` and `POST /callback`.
pub fn routes(
    state: SharedState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let liveness = warp::path::end()
        .and(warp::get())
        .map(|| LIVENESS_TEXT);

    // Path before method, so unknown paths are 404 rather than 405
    let callback = warp::path!("callback")
        .and(warp::post())
        .and(warp::header::optional::<String>(SIGNATURE_HEADER))
        .and(warp::body::content_length_limit(MAX_WEBHOOK_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .then(handle_callback);

    liveness.or(callback)
}

fn with_state(state: SharedState) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &BotConfig, secrets: Secrets) -> Result<(), ServeError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = tokio::net::lookup_host(address.as_str())
        .await
        .map_err(|source| ServeError::Resolve {
            address: address.clone(),
            source,
        })?
        .next()
        .ok_or_else(|| ServeError::NoAddress(address.clone()))?;

    let state = Arc::new(AppState::from_config(config, &secrets));
    let (bound, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })?;
    info!(addr = %bound, "webhook server listening");
    server.await;
    Ok(())
}

async fn handle_callback(
    signature: Option<String>,
    body: Bytes,
    state: SharedState,
) -> warp::reply::WithStatus<&'static str> {
    let payload = match parse_webhook(&state.verifier, signature.as_deref(), &body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "rejecting webhook");
            return warp::reply::with_status("Bad Request", StatusCode::BAD_REQUEST);
        }
    };

    let worker = Arc::clone(&state);
    match tokio::task::spawn_blocking(move || dispatch(&worker, &payload)).await {
        Ok(handled) => debug!(handled, "webhook processed"),
        Err(err) => error!(%err, "webhook dispatch task failed"),
    }
    warp::reply::with_status("OK", StatusCode::OK)
}

/// Verify the raw body against its signature, then parse it.
pub fn parse_webhook(
    verifier: &SignatureVerifier,
    signature: Option<&str>,
    body: &[u8],
) -> Result<WebhookPayload, WebhookError> {
    let signature = signature.ok_or(WebhookError::MissingSignature)?;
    if !verifier.verify(body, signature) {
        return Err(WebhookError::InvalidSignature);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Analyze and answer every image event in `payload`.
///
/// Returns how many image events were handled; other events are ignored.
pub fn dispatch(state: &AppState, payload: &WebhookPayload) -> usize {
    let mut handled = 0;
    for request in payload.image_requests() {
        handle_image(state, &request);
        handled += 1;
    }
    handled
}

/// Download, analyze and reply to one image message.
pub fn handle_image(state: &AppState, request: &ImageRequest<'_>) {
    let message_id = request.message_id;
    let reply = match state.api.fetch_content(message_id) {
        Ok(bytes) => {
            debug!(message_id, bytes = bytes.len(), "downloaded image");
            match analyze(&state.decoder, &bytes, &state.params) {
                Ok(result) => {
                    info!(
                        message_id,
                        fractal_dimension = result.fractal_dimension,
                        severity = %result.severity,
                        "image analyzed"
                    );
                    output::success_reply(&result)
                }
                Err(err) => {
                    warn!(message_id, %err, "analysis failed");
                    output::error_reply(&err)
                }
            }
        }
        Err(err) => {
            error!(message_id, %err, "could not download image");
            output::error_reply(&err)
        }
    };

    if let Err(err) = state.api.reply_text(request.reply_token, &reply) {
        error!(message_id, %err, "could not deliver reply");
    }
}
