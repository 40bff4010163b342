//! Extraction orchestration: one image in, a batch of candidates out.
//!
//! The orchestrator builds a single vision-model request (image payload plus
//! instruction prompt), submits it over one of two interchangeable
//! transports, and normalizes whatever text comes back. One attempt, no
//! internal retry, no client-side timeout; a failed request discards the
//! whole batch and retry is always user-initiated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::candidate::EventCandidate;
use crate::config::{RuntimePreferences, TransportMode};
use crate::normalize::normalize;

/// Chat-completions endpoint used by the direct transport.
const COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Path the relay exposes, appended to the configured relay base URL.
pub const RELAY_EXTRACT_PATH: &str = "/api/extract";

/// Errors produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No JSON could be recovered from the model's text. Surfaced as a
    /// retry prompt; distinct from a valid-but-empty result.
    #[error("the model response contained no readable event data")]
    MalformedResponse,
    /// Transport, network, or relay failure, carrying the upstream message
    /// when one was available.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    /// Missing or unusable credential/transport configuration. Raised
    /// before any request is issued.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        ExtractError::ExtractionFailed(format!("HTTP error: {err}"))
    }
}

/// Image bytes ready to send: base64 payload plus MIME type.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub base64_data: String,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            base64_data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// `data:` URL form used by chat-completions image parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

/// Build the instruction prompt for one extraction request.
///
/// `now` anchors relative dates ("next Friday") to the viewer's clock; it is
/// a parameter rather than read inside so tests stay deterministic.
pub fn build_prompt(now: DateTime<Local>) -> String {
    format!(
        r##"You are an assistant that reads photographed event flyers, invitations, and schedules.

The current date and time is {current}. Use it to resolve relative dates.

Extract every event in the image and return a raw JSON array (no markdown, no code fences, no commentary). Each element must have exactly these string fields:
  title, startDateTime, endDateTime, location, description, recurrence

Rules:
- Dates and times use the format YYYY-MM-DDTHH:mm:ss with no timezone suffix.
- A bare weekday name ("Friday") means its next future occurrence after the current date.
- If the layout is a table or schedule, emit one event per row. A heading shared by several rows (such as a date above a column of times) applies to every row beneath it.
- If no end time is stated, estimate endDateTime as 2 hours after startDateTime.
- recurrence is an RRULE string of the form RRULE:FREQ=<DAILY|WEEKLY|MONTHLY|YEARLY>;INTERVAL=<N>. Emit it when the text implies repetition (for example "every week", or a bare weekday with no date, which means weekly). Otherwise use an empty string.
- Use an empty string for anything the image does not state.
- Return [] if the image contains no events."##,
        current = now.format("%A, %B %-d, %Y at %H:%M")
    )
}

/// Capability interface for submitting one extraction request.
///
/// Both transports produce the same raw-text contract consumed by the
/// normalizer, so the orchestrator never branches on the mode.
#[allow(async_fn_in_trait)]
pub trait SubmitExtraction {
    async fn submit(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractError>;
}

/// Direct transport: the caller holds the model credential and talks to the
/// model service itself.
#[derive(Clone)]
pub struct DirectTransport {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl SubmitExtraction for DirectTransport {
    async fn submit(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractError> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: Vec<ContentPart<'a>>,
        }

        #[derive(Serialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        enum ContentPart<'a> {
            Text { text: &'a str },
            ImageUrl { image_url: ImageUrl },
        }

        #[derive(Serialize)]
        struct ImageUrl {
            url: String,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let request_body = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractError::ExtractionFailed(upstream_message(
                &detail,
                &format!("model API error: {status}"),
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ExtractError::ExtractionFailed("no response content from model".into()))
    }
}

/// Relay transport: a server-side relay holds the credential; the client
/// sends only the image payload.
#[derive(Clone)]
pub struct RelayTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl RelayTransport {
    /// `base_url` is the relay origin, e.g. `http://127.0.0.1:4096`.
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RELAY_EXTRACT_PATH),
            client: reqwest::Client::new(),
        }
    }
}

/// Request body spoken to the relay.
#[derive(Serialize, Deserialize)]
pub struct RelayRequest {
    #[serde(rename = "base64Image")]
    pub base64_image: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl SubmitExtraction for RelayTransport {
    async fn submit(&self, image: &ImagePayload, _prompt: &str) -> Result<String, ExtractError> {
        // The relay builds its own prompt so the instruction text and the
        // credential live on the same side of the wire.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RelayRequest {
                base64_image: image.base64_data.clone(),
                mime_type: image.mime_type.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::ExtractionFailed(upstream_message(
                &body,
                &format!("relay error: {status}"),
            )));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ExtractError::ExtractionFailed(
                "empty response from relay".into(),
            ));
        }
        Ok(text)
    }
}

/// Pull a human-readable message out of an `{"error": ...}` body, falling
/// back to the given status line.
fn upstream_message(body: &str, fallback: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: serde_json::Value,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = match parsed.error {
            serde_json::Value::String(text) => text,
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
        if !message.trim().is_empty() {
            return message;
        }
    }
    fallback.to_string()
}

/// Transport selected from static configuration.
#[derive(Clone)]
pub enum Transport {
    Direct(DirectTransport),
    Relay(RelayTransport),
}

impl Transport {
    /// Build the configured transport, failing fast when the direct mode
    /// has no credential to work with.
    pub fn from_preferences(prefs: &RuntimePreferences) -> Result<Self, ExtractError> {
        match prefs.transport {
            TransportMode::Direct => {
                let api_key = prefs
                    .resolve_api_key()
                    .map_err(|err| ExtractError::Configuration(err.to_string()))?
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        ExtractError::Configuration(
                            "no API key configured for direct extraction".into(),
                        )
                    })?;
                Ok(Transport::Direct(DirectTransport::new(
                    api_key,
                    prefs.effective_model(),
                )))
            }
            TransportMode::Relay => {
                let base = prefs.relay_url.trim();
                if base.is_empty() {
                    return Err(ExtractError::Configuration(
                        "relay mode selected but no relay URL configured".into(),
                    ));
                }
                Ok(Transport::Relay(RelayTransport::new(base)))
            }
        }
    }
}

impl SubmitExtraction for Transport {
    async fn submit(&self, image: &ImagePayload, prompt: &str) -> Result<String, ExtractError> {
        match self {
            Transport::Direct(direct) => direct.submit(image, prompt).await,
            Transport::Relay(relay) => relay.submit(image, prompt).await,
        }
    }
}

/// The orchestrator: submits one request and normalizes the response.
pub struct Extractor<T = Transport> {
    transport: T,
}

impl Extractor<Transport> {
    pub fn from_preferences(prefs: &RuntimePreferences) -> Result<Self, ExtractError> {
        Ok(Self::with_transport(Transport::from_preferences(prefs)?))
    }
}

impl<T: SubmitExtraction> Extractor<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// One extraction attempt. The relay may hand back pre-normalized JSON
    /// instead of raw model text; normalization accepts either.
    pub async fn extract(&self, image: &ImagePayload) -> Result<Vec<EventCandidate>, ExtractError> {
        let prompt = build_prompt(Local::now());
        let raw = self.transport.submit(image, &prompt).await?;
        let candidates = normalize(&raw)?;
        info!(count = candidates.len(), "extraction produced candidates");
        Ok(candidates)
    }
}
