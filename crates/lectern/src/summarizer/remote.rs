//! Remote summarizer using OpenAI-compatible APIs
//!
//! Sends the batch as a rendered dialogue to any OpenAI-compatible
//! `/chat/completions` endpoint. URL, model and the API key environment
//! variable come from [`RemoteSummarizerConfig`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RemoteSummarizerConfig;
use crate::memory::types::Turn;
use crate::summarizer::prompts::{SUMMARY_SYSTEM_PROMPT, SUMMARY_USER_PROMPT};
use crate::summarizer::{Summarizer, SummarizerError};

/// Remote summarizer using OpenAI-compatible HTTP APIs
#[derive(Debug)]
pub struct RemoteSummarizer {
    client: Client,
    config: RemoteSummarizerConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl RemoteSummarizer {
    /// Create a new remote summarizer with the given configuration
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env` and fails if it is not set.
    pub fn new(config: &RemoteSummarizerConfig) -> Result<Self, SummarizerError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            SummarizerError::ConfigError(format!(
                "API key env var '{}' not set",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummarizerError::ApiError(e.to_string()))?;

        info!(
            "RemoteSummarizer initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Render turns as one `Label: text` line each
    fn render_dialogue(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|t| format!("{}: {}", t.role().label(), t.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Call the remote API, retrying 429s and transport errors
    ///
    /// Makes at most `max_retries` attempts. The wait starts at
    /// `retry_base_delay_ms` and doubles; there is no wait after the last
    /// attempt.
    async fn call_api(&self, conversation: &str) -> Result<String, SummarizerError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SUMMARY_SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: SUMMARY_USER_PROMPT.replace("{conversation}", conversation),
                },
            ],
            temperature: 0.3,
            max_tokens: 256,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );
        debug!("Calling remote API at: {}", url);

        let max_retries = self.config.max_retries.max(1);
        let mut last_error = None;
        let mut delay = Duration::from_millis(self.config.retry_base_delay_ms);

        for attempt in 0..max_retries {
            let retries_left = attempt + 1 < max_retries;
            match self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status == 429 {
                        last_error = Some(format!("rate limited ({status})"));
                        if retries_left {
                            warn!(
                                "Rate limited on attempt {}/{}, waiting {:?}",
                                attempt + 1,
                                max_retries,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            delay *= 2;
                        }
                        continue;
                    }

                    if !status.is_success() {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(SummarizerError::ApiError(format!(
                            "API returned {status}: {error_text}"
                        )));
                    }

                    let completion: ChatCompletionResponse = response
                        .json()
                        .await
                        .map_err(|e| SummarizerError::ParseError(e.to_string()))?;

                    return completion
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or_else(|| SummarizerError::ApiError("Empty response".to_string()));
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    last_error = Some(err_msg.clone());
                    if retries_left {
                        warn!(
                            "Request failed on attempt {}/{}, retrying: {}",
                            attempt + 1,
                            max_retries,
                            err_msg
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(SummarizerError::ApiError(format!(
            "Failed after {} attempts: {}",
            max_retries,
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        )))
    }
}

#[async_trait]
impl Summarizer for RemoteSummarizer {
    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummarizerError> {
        let dialogue = Self::render_dialogue(turns);
        let summary = self.call_api(&dialogue).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummarizerError::ParseError(
                "Model returned an empty summary".to_string(),
            ));
        }
        debug!("Remote summary of {} turns: {}", turns.len(), summary);
        Ok(summary.to_string())
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty() && !self.config.api_url.is_empty()
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
