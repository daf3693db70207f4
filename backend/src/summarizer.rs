use crate::config::SummarizerConfig;
use crate::types::EMPTY_METADATA;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

const PROMPT_TEMPLATE: &str = "Summarize the following DLP metadata, highlighting key attributes \
     and performance insights:\n\nMetadata: ";

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summarizer not configured")]
    NotConfigured,
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Model returned no summary")]
    EmptyResponse,
}

/// Turns a DLP's opaque metadata string into a short synopsis.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, metadata: &str) -> Result<String, SummaryError>;
}

pub fn build_prompt(metadata: &str) -> String {
    let metadata = if metadata.trim().is_empty() {
        EMPTY_METADATA
    } else {
        metadata
    };
    format!("{}{}", PROMPT_TEMPLATE, metadata)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    fn into_summary(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Gemini `generateContent` client.
pub struct GeminiSummarizer {
    http_client: HttpClient,
    config: SummarizerConfig,
}

impl GeminiSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, SummaryError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent("DlpRankings/1.0")
            .build()?;

        Ok(Self { http_client, config })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, metadata: &str) -> Result<String, SummaryError> {
        let api_key = self.config.api_key.as_deref().ok_or(SummaryError::NotConfigured)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(metadata),
                }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API error: {} - {}", status, error_text);
            return Err(SummaryError::ApiError(format!("{}: {}", status, error_text)));
        }

        let body: GenerateContentResponse = response.json().await?;
        let summary = body.into_summary().ok_or(SummaryError::EmptyResponse)?;
        info!("📝 Summarized {} bytes of metadata", metadata.len());
        Ok(summary)
    }
}
