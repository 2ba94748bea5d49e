use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::GeminiSettings;
use crate::models::{MessageTone, MAX_MESSAGE_CHARS};

/// Returned when the model answers with nothing usable.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Happy Valentine's Day! 💘";

/// Returned on any transport, status or decoding failure.
pub const FAILURE_MESSAGE: &str = "Happy Valentine's Day! You make my world brighter. 💖";

/// Writes a message for a recipient in a given tone.
///
/// Implementations never fail: whatever goes wrong is logged and replaced
/// with a fixed message, so callers always get display-ready text back.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, recipient: &str, tone: MessageTone) -> String;
}

#[derive(Debug, thiserror::Error)]
enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {0}: {1}")]
    Status(StatusCode, String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` over REST.
pub struct GeminiGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(settings: &GeminiSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.8,
                top_p: 0.9,
            },
        };

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status(status, detail));
        }

        let parsed: GenerateContentResponse = response.json().await?;

        // same as the SDK's `response.text`: every text part of the first candidate
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl MessageGenerator for GeminiGenerator {
    async fn generate(&self, recipient: &str, tone: MessageTone) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("No Gemini API key configured, using fallback message");
            return FAILURE_MESSAGE.to_string();
        };

        match self.request(api_key, &build_prompt(recipient, tone)).await {
            Ok(text) => finalize(&text),
            Err(e) => {
                error!("Gemini error: {}", e);
                FAILURE_MESSAGE.to_string()
            }
        }
    }
}

pub fn build_prompt(recipient: &str, tone: MessageTone) -> String {
    format!(
        "Write a short, heartfelt Valentine's Day message for someone named \"{}\". \n  \
         The tone should be {}. \n  \
         Keep it under {} characters. \n  \
         Do not use quotes around the message.",
        recipient, tone, MAX_MESSAGE_CHARS
    )
}

/// Make model output display-ready: trimmed, unquoted, within the message cap.
fn finalize(raw: &str) -> String {
    let mut text = raw.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }

    if text.is_empty() {
        return EMPTY_RESPONSE_MESSAGE.to_string();
    }

    let clamped: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
    clamped.trim_end().to_string()
}
