//! Text-completion API interaction.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for sending one completion request
//! - [`CompletionClient`]: the HTTP implementation (bearer-token POST)
//! - [`summarize`] / [`classify_sentiment`]: fixed-template prompts built on
//!   top of any [`AskAsync`], turning an empty answer into [`EMPTY_RESPONSE`]
//!
//! Retrying is layered on with [`crate::retry::Retrying`].

use crate::error::{DigestError, Result};
use crate::models::EMPTY_RESPONSE;
use crate::utils::truncate_for_log;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for async completion requests.
///
/// Implementors send one [`CompletionRequest`] and return the decoded
/// response. This abstraction allows decorators (retry) and test doubles.
pub trait AskAsync {
    async fn ask(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Body of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    /// A four-sentence summary of an article body.
    pub fn summarize(model: &str, article: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: format!(
                "Summarize the following news article, in maximum four sentences in a style that is easy to understand\n article:\n{article}"
            ),
            max_tokens: 200,
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 1.0,
        }
    }

    /// A sentiment label for a summary.
    pub fn sentiment(model: &str, summary: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: format!(
                "Classify the sentiment in the following news article summary:\n{summary}\n\nSentiment:"
            ),
            max_tokens: 100,
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Decoded completion response. Every field is optional and unknown fields
/// are ignored; only `choices[0].text` feeds the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Option<Vec<CompletionChoice>>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionChoice {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Usage {
    pub total_tokens: Option<u64>,
}

impl CompletionResponse {
    /// Trimmed text of the first choice, if there is any non-blank text.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// [`first_text`](Self::first_text) or the [`EMPTY_RESPONSE`] placeholder.
    pub fn text_or_placeholder(&self) -> String {
        self.first_text().unwrap_or(EMPTY_RESPONSE).to_string()
    }
}

/// HTTP client for an OpenAI-style `/v1/completions` endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(http: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl AskAsync for CompletionClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn ask(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                elapsed_ms = dt.as_millis(),
                body = %truncate_for_log(&body, 300),
                "Completion API returned an error status"
            );
            return Err(DigestError::Api {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed = parse_response(&body)?;
        debug!(
            elapsed_ms = dt.as_millis(),
            id = ?parsed.id,
            model = ?parsed.model,
            finish_reason = ?parsed
                .choices
                .as_ref()
                .and_then(|c| c.first())
                .and_then(|c| c.finish_reason.as_deref()),
            total_tokens = ?parsed.usage.as_ref().and_then(|u| u.total_tokens),
            "Completion API answered"
        );
        Ok(parsed)
    }
}

/// Decode a completion response body.
pub fn parse_response(body: &str) -> Result<CompletionResponse> {
    serde_json::from_str(body)
        .map_err(|e| DigestError::Decode(format!("{e}; body: {}", truncate_for_log(body, 200))))
}

/// Summarize an article body. A response without usable text yields the placeholder.
pub async fn summarize<A: AskAsync>(api: &A, model: &str, article: &str) -> Result<String> {
    let response = api.ask(&CompletionRequest::summarize(model, article)).await?;
    Ok(response.text_or_placeholder())
}

/// Label the sentiment of a summary. A response without usable text yields the placeholder.
pub async fn classify_sentiment<A: AskAsync>(
    api: &A,
    model: &str,
    summary: &str,
) -> Result<String> {
    let response = api.ask(&CompletionRequest::sentiment(model, summary)).await?;
    Ok(response.text_or_placeholder())
}
