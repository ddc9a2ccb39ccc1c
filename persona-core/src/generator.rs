//! Persona text generation via the Gemini `generateContent` API
//!
//! Provides a `TextGenerator` trait with one implementation:
//! - **Gemini**: cloud text generation (`GeminiTextClient`)
//!
//! Both calls are single request/response round trips with no retries.
//! [`enrich`] combines them into one [`Enrichment`] so that a failed call is
//! always reported as [`GenerationOutcome::Unavailable`] and never mixed into
//! narrative text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::{GenerationConfig, GEMINI_API_KEY_ENV};
use crate::models::PersonaRecord;

/// Stored description when no summary could be produced.
pub const FALLBACK_DESCRIPTION: &str = "Description not available.";

// ============================================================================
// TextGenerator trait
// ============================================================================

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Write a persona narrative for `name`, steered by optional few-shot `context`.
    async fn generate(
        &self,
        name: &str,
        profession: &str,
        context: &str,
    ) -> Result<String, GenerationError>;

    /// Condense a narrative into a one-sentence description.
    async fn summarize(&self, name: &str, narrative: &str) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error and result types
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Response contained no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    Unavailable { reason: String },
}

impl GenerationOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Generated(t) => Some(t),
            GenerationOutcome::Unavailable { .. } => None,
        }
    }

    pub fn description_or_fallback(&self) -> String {
        self.text().unwrap_or(FALLBACK_DESCRIPTION).to_string()
    }

    fn from_result(result: Result<String, GenerationError>) -> Self {
        match result {
            Ok(text) => GenerationOutcome::Generated(text),
            Err(e) => GenerationOutcome::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub narrative: GenerationOutcome,
    pub description: GenerationOutcome,
}

impl Enrichment {
    /// First failure reason, if either step failed.
    pub fn failure(&self) -> Option<&str> {
        [&self.narrative, &self.description]
            .into_iter()
            .find_map(|o| match o {
                GenerationOutcome::Unavailable { reason } => Some(reason.as_str()),
                GenerationOutcome::Generated(_) => None,
            })
    }
}

/// Generate a narrative for `record`, then summarize it.
///
/// The summary step is skipped when the narrative could not be produced.
pub async fn enrich(
    generator: &dyn TextGenerator,
    record: &PersonaRecord,
    context: &str,
) -> Enrichment {
    let narrative = GenerationOutcome::from_result(
        generator
            .generate(&record.name, &record.profession, context)
            .await,
    );

    let description = match &narrative {
        GenerationOutcome::Generated(text) => {
            GenerationOutcome::from_result(generator.summarize(&record.name, text).await)
        }
        GenerationOutcome::Unavailable { reason } => GenerationOutcome::Unavailable {
            reason: reason.clone(),
        },
    };

    let enrichment = Enrichment {
        narrative,
        description,
    };

    if let Some(reason) = enrichment.failure() {
        tracing::warn!(
            backend = generator.name(),
            id = record.id,
            error = %reason,
            "Persona text generation failed"
        );
    }

    enrichment
}

// ============================================================================
// Prompts
// ============================================================================

pub fn narrative_prompt(name: &str, profession: &str, context: &str) -> String {
    let mut prompt = String::new();
    if !context.trim().is_empty() {
        prompt.push_str("Here are some example personas for style reference:\n\n");
        prompt.push_str(context.trim());
        prompt.push_str("\n\n---\n\n");
    }
    prompt.push_str(&format!(
        "Write a detailed character persona for {name}, who works as a {profession}. \
         Describe their background, personality, motivations and daily life in a few paragraphs."
    ));
    prompt
}

pub fn summary_prompt(name: &str, narrative: &str) -> String {
    format!(
        "Summarize the following persona of {name} in exactly one sentence:\n\n{}",
        narrative.trim()
    )
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiTextClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiTextConfig {
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub base_url: String,
}

impl GeminiTextConfig {
    /// Take model and endpoint from config; the key comes from `GOOGLE_API_KEY`.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            api_key: std::env::var(GEMINI_API_KEY_ENV).unwrap_or_default(),
            model: config.model.clone(),
            timeout_seconds: config.timeout_seconds,
            base_url: config.base_url.clone(),
        }
    }
}

/// Gemini text client: calls `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiTextClient {
    client: Client,
    config: GeminiTextConfig,
}

impl GeminiTextClient {
    pub fn new(config: GeminiTextConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one prompt and return the concatenated text parts of the first candidate.
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(GenerationError::Api { code, message });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text: String = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    async fn generate(
        &self,
        name: &str,
        profession: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        self.complete(&narrative_prompt(name, profession, context)).await
    }

    async fn summarize(&self, name: &str, narrative: &str) -> Result<String, GenerationError> {
        self.complete(&summary_prompt(name, narrative)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// TESTS
// ============================================================================
