use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Summarizer;
use crate::config::LlmConfig;
use crate::utils::spinner;

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completions response, only the parts we read
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Summarizer talking to an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    show_progress: bool,
}

impl OpenAiSummarizer {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            show_progress: false,
        })
    }

    /// Draw a spinner on stderr while waiting for the completion
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str, max_tokens: u32) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
        }
    }

    async fn send(&self, prompt: &str, max_tokens: u32) -> Result<(reqwest::StatusCode, String)> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, max_tokens))
            .send()
            .await
            .context("Failed to send completion request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read completion response")?;

        Ok((status, body))
    }
}

/// Pull the first choice's text out of a response body
fn extract_content(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("Failed to parse completion response")?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        anyhow::bail!("Completion response contained no text");
    }

    Ok(content)
}

/// Best-effort readable message for a failed request
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        tracing::info!("Requesting summary from {} ({} max tokens)", self.model, max_tokens);

        let progress = spinner(format!("Waiting for {} to summarize...", self.model), self.show_progress);
        let reply = self.send(prompt, max_tokens).await;
        progress.finish_and_clear();

        let (status, body) = reply?;

        if !status.is_success() {
            anyhow::bail!("HTTP {}: {}", status, error_message(&body));
        }

        extract_content(&body)
    }
}
