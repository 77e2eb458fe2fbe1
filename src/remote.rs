//! Remote OCR + translation service.
//! Both calls go to a chat-style LLM endpoint that answers with a free-text
//! `completion`; the first `{...}` object in it is parsed, and plain text is
//! accepted as a fallback. No automatic retries: a failure is returned to the
//! caller, which may offer "try again".

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::language::Language;

/// Sentinel the model returns when an image has no legible text.
pub const NO_TEXT_FOUND: &str = "NO_TEXT_FOUND";

const DEFAULT_OCR_CONFIDENCE: f32 = 75.0;
const DEFAULT_TRANSLATION_CONFIDENCE: f32 = 85.0;

/// A single OCR fix reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

/// Text extracted from an image plus what the service inferred about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrAnalysis {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub corrected_text: Option<String>,
    #[serde(default = "default_ocr_confidence")]
    pub confidence: f32,
    /// menu, document, chat, sign, technical, business, casual or other.
    #[serde(default = "default_context_type")]
    pub context_type: String,
    #[serde(default = "default_context_icon")]
    pub context_icon: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub has_corrections: bool,
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

fn default_ocr_confidence() -> f32 {
    DEFAULT_OCR_CONFIDENCE
}

fn default_context_type() -> String {
    "other".into()
}

fn default_context_icon() -> String {
    "📝".into()
}

fn default_tone() -> String {
    "casual".into()
}

impl OcrAnalysis {
    /// Analysis for a completion that carried no JSON object.
    pub fn plain(text: &str) -> Self {
        let text = text.trim().to_string();
        Self {
            corrected_text: Some(text.clone()),
            text,
            confidence: DEFAULT_OCR_CONFIDENCE,
            context_type: default_context_type(),
            context_icon: default_context_icon(),
            tone: default_tone(),
            has_corrections: false,
            corrections: Vec::new(),
        }
    }

    /// Corrected text when present, otherwise the raw extraction.
    pub fn extracted_text(&self) -> &str {
        match self.corrected_text.as_deref() {
            Some(corrected) if !corrected.trim().is_empty() => corrected,
            _ => &self.text,
        }
    }

    /// False for the no-text sentinel or fewer than two characters.
    pub fn has_text(&self) -> bool {
        let text = self.extracted_text().trim();
        text != NO_TEXT_FOUND && text.chars().count() >= 2
    }
}

/// A labeled alternative phrasing ("Formal", "Literal", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub label: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    pub primary: String,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default = "default_translation_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub explanation: String,
}

fn default_translation_confidence() -> f32 {
    DEFAULT_TRANSLATION_CONFIDENCE
}

impl TranslationOutcome {
    /// Outcome for a completion that carried no JSON object.
    pub fn plain(text: &str) -> Self {
        Self {
            primary: text.trim().to_string(),
            alternatives: Vec::new(),
            confidence: DEFAULT_TRANSLATION_CONFIDENCE,
            explanation: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("API error: {0}")]
    Api(String),
    #[error("service returned HTTP {status}")]
    Http { status: u16 },
    #[error("service request timed out")]
    Timeout,
    #[error("offline and no cached translation")]
    Offline,
    #[error("no readable text detected in the image")]
    NoTextFound,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if let Some(status) = e.status() {
            RemoteError::Http {
                status: status.as_u16(),
            }
        } else {
            RemoteError::Api(e.to_string())
        }
    }
}

impl RemoteError {
    /// Whether offering the user a retry makes sense.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RemoteError::InvalidInput(_))
    }
}

/// OCR and translation backend.
#[async_trait]
pub trait VisionTranslator: Send + Sync {
    /// Extract text from an encoded image (JPEG/PNG bytes).
    async fn analyze_image(&self, image: &[u8]) -> Result<OcrAnalysis, RemoteError>;

    async fn translate(
        &self,
        text: &str,
        from: &Language,
        to: &Language,
    ) -> Result<TranslationOutcome, RemoteError>;
}

/// Finds the JSON object inside a model completion.
pub struct CompletionParser {
    object: Regex,
}

impl CompletionParser {
    pub fn new() -> Self {
        Self {
            // Outermost braces, spanning newlines
            object: Regex::new(r"(?s)\{.*\}").unwrap(),
        }
    }

    fn parse_object<T: for<'de> Deserialize<'de>>(&self, completion: &str) -> Option<T> {
        let raw = self.object.find(completion)?.as_str();
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "completion JSON parse failed, using plain text");
                None
            }
        }
    }

    pub fn parse_ocr(&self, completion: &str) -> OcrAnalysis {
        self.parse_object(completion)
            .unwrap_or_else(|| OcrAnalysis::plain(completion))
    }

    pub fn parse_translation(&self, completion: &str) -> TranslationOutcome {
        self.parse_object(completion)
            .unwrap_or_else(|| TranslationOutcome::plain(completion))
    }
}

impl Default for CompletionParser {
    fn default() -> Self {
        Self::new()
    }
}

const OCR_PROMPT: &str = r#"Extract all text visible in this image. Respond with one JSON object:
{"text": "...", "corrected_text": "text with obvious OCR mistakes fixed, or the same text", "confidence": 0-100,
 "context_type": "menu|document|chat|sign|technical|business|casual|other", "context_icon": "one emoji",
 "tone": "formal|informal|technical|casual", "has_corrections": true|false,
 "corrections": [{"original": "...", "corrected": "..."}]}
If the image has no text, respond with {"text": "NO_TEXT_FOUND", "confidence": 0}."#;

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: String,
}

/// HTTP client for the chat-completion endpoint.
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    parser: CompletionParser,
}

impl LlmClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Api(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            parser: CompletionParser::new(),
        })
    }

    async fn complete(&self, body: serde_json::Value) -> Result<String, RemoteError> {
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "completion request failed");
            return Err(RemoteError::Http {
                status: status.as_u16(),
            });
        }
        let parsed: CompletionResponse = response.json().await?;
        debug!(chars = parsed.completion.len(), "completion received");
        Ok(parsed.completion)
    }
}

#[async_trait]
impl VisionTranslator for LlmClient {
    async fn analyze_image(&self, image: &[u8]) -> Result<OcrAnalysis, RemoteError> {
        if image.is_empty() {
            return Err(RemoteError::InvalidInput("empty image".into()));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": OCR_PROMPT},
                    {"type": "image", "image": encoded}
                ]
            }]
        });
        let completion = self.complete(body).await?;
        Ok(self.parser.parse_ocr(&completion))
    }

    async fn translate(
        &self,
        text: &str,
        from: &Language,
        to: &Language,
    ) -> Result<TranslationOutcome, RemoteError> {
        if text.trim().is_empty() {
            return Err(RemoteError::InvalidInput("empty text".into()));
        }
        let prompt = build_translation_prompt(text, from, to);
        let body = serde_json::json!({
            "messages": [{"role": "user", "content": prompt}]
        });
        let completion = self.complete(body).await?;
        Ok(self.parser.parse_translation(&completion))
    }
}

fn build_translation_prompt(text: &str, from: &Language, to: &Language) -> String {
    format!(
        "Translate the text below from {} to {}. Respond with one JSON object:\n\
         {{\"primary\": \"the most natural translation\", \
         \"alternatives\": [{{\"label\": \"Formal\", \"text\": \"...\", \"description\": \"...\"}}, \
         {{\"label\": \"Literal\", \"text\": \"...\", \"description\": \"...\"}}], \
         \"confidence\": 0-100, \"explanation\": \"short note on choices, may be empty\"}}\n\n\
         Text:\n{}",
        from.name, to.name, text
    )
}
