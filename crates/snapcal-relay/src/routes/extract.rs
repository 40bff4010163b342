//! The relay's single endpoint: accept an image, call the model with the
//! relay-held credential, hand the raw text back unchanged.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Local;
use tracing::{info, warn};

use snapcal_core::extract::{
    ImagePayload, RELAY_EXTRACT_PATH, RelayRequest, SubmitExtraction, build_prompt,
};

use crate::routes::ApiError;
use crate::state::AppState;

/// Largest accepted decoded image.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Request body ceiling: base64 inflates by 4/3, plus JSON framing slack.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(RELAY_EXTRACT_PATH, post(extract))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// POST /api/extract - forward one image to the model service.
async fn extract(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RelayRequest>,
) -> Result<String, ApiError> {
    if request.base64_image.trim().is_empty() {
        return Err(ApiError::bad_request("base64Image is required"));
    }
    if request.mime_type.trim().is_empty() {
        return Err(ApiError::bad_request("mimeType is required"));
    }

    let decoded = STANDARD
        .decode(request.base64_image.trim())
        .map_err(|_| ApiError::bad_request("base64Image is not valid base64"))?;
    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::payload_too_large(format!(
            "image is {} bytes; the relay accepts at most {MAX_IMAGE_BYTES}",
            decoded.len()
        )));
    }

    if !state.allow_request(addr.ip()) {
        warn!(client = %addr.ip(), "rate limit exceeded");
        return Err(ApiError::rate_limited(
            "rate limit exceeded; try again in a minute",
        ));
    }

    info!(client = %addr.ip(), bytes = decoded.len(), mime = %request.mime_type, "forwarding extraction");

    let payload = ImagePayload {
        base64_data: request.base64_image,
        mime_type: request.mime_type,
    };
    let prompt = build_prompt(Local::now());

    state
        .transport
        .submit(&payload, &prompt)
        .await
        .map_err(|err| ApiError::upstream(err.to_string()))
}
