//! Generative summaries via an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompts::{PromptManager, SYSTEM_PROMPT};
use super::Summarizer;
use crate::arxiv::Paper;
use crate::error::SummaryError;

/// Default API base.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_sentences: u32,
}

impl OpenAiConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_sentences: 3,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Summarizer backed by `/chat/completions`.
pub struct OpenAiSummarizer {
    config: OpenAiConfig,
    http: reqwest::Client,
    prompts: PromptManager,
}

impl OpenAiSummarizer {
    pub fn new(config: OpenAiConfig) -> Result<Self, SummaryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SummaryError::Backend(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            http,
            prompts: PromptManager::new()?,
        })
    }

    fn headers(&self) -> Result<HeaderMap, SummaryError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| SummaryError::Backend(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn summarize(&self, paper: &Paper) -> Result<String, SummaryError> {
        let prompt = self.prompts.render(
            "summarize",
            &serde_json::json!({
                "max_sentences": self.config.max_sentences,
                "title": paper.title,
                "authors": paper.author_line(5),
                "category": paper.primary_category,
                "abstract": paper.abstract_text,
            }),
        )?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(prompt),
                },
            ],
            // Zero temperature keeps repeated runs stable.
            temperature: 0.0,
            max_tokens: 300,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(id = %paper.id, model = %self.config.model, "Requesting summary");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummaryError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(SummaryError::Backend(format!("API error ({status}): {preview}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::Backend(format!("unreadable response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SummaryError::Backend("empty completion".to_string()));
        }
        Ok(text)
    }
}
