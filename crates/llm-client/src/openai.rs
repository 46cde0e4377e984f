//! OpenAI-compatible `chat/completions` over HTTP.
//!
//! Request and response bodies use async-openai's types; the HTTP call itself goes through
//! reqwest so the status code and `Retry-After` header reach the error classification.

use std::time::Duration;

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::{debug, info, instrument, warn};

use crate::{mask_token, CompletionClient, CompletionError, CompletionRequest};

/// Longest error body excerpt carried into an error message.
const ERROR_BODY_EXCERPT: usize = 300;

/// [`CompletionClient`] for OpenAI and OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompletionClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, CompletionError> {
    let content = msg.content.clone();
    let built: Result<ChatCompletionRequestMessage, _> = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
    };
    built.map_err(|e| CompletionError::InvalidRequest(e.to_string()))
}

#[allow(deprecated)]
fn build_request_body(
    request: &CompletionRequest,
) -> Result<CreateChatCompletionRequest, CompletionError> {
    let messages = request
        .messages
        .iter()
        .map(to_openai_message)
        .collect::<Result<Vec<_>, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(request.model.clone())
        .messages(messages)
        .temperature(request.temperature)
        .max_tokens(request.max_tokens)
        .build()
        .map_err(|e| CompletionError::InvalidRequest(e.to_string()))
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Extracts `error.message` from an OpenAI error body, falling back to a raw excerpt.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string));
    if let Some(message) = message {
        return message;
    }
    body.chars().take(ERROR_BODY_EXCERPT).collect()
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = build_request_body(request)?;

        info!(
            model = %request.model,
            message_count = request.messages.len(),
            api_key = %mask_token(&self.api_key),
            "OpenAI chat_completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            let err = CompletionError::from_status(status.as_u16(), error_message(&text), retry_after);
            warn!(status = status.as_u16(), error = %err, "OpenAI chat_completion failed");
            return Err(err);
        }

        let text = response.text().await?;
        let parsed: CreateChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            CompletionError::Network(format!("undecodable completion response: {}", e))
        })?;

        if let Some(ref u) = parsed.usage {
            info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat_completion usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidRequest("no choices in response".to_string()))?;
        let content = choice.message.content.unwrap_or_default();
        debug!(reply_len = content.len(), "OpenAI chat_completion reply");
        Ok(content)
    }
}
