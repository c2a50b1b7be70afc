use crate::{
    config::{has_llm_provider_configured, Config},
    error::{AppError, Result},
};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single-turn chat completion: one system instruction, one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiClient {
    /// Returns `Ok(None)` when no credential is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        if !has_llm_provider_configured(config) {
            return Ok(None);
        }
        let api_key = config
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.llm_timeout_ms))
            .build()
            .map_err(|err| AppError::Internal(format!("HTTP client build failed: {}", err)))?;

        Ok(Some(Self {
            client,
            api_key,
            api_base: config.openai_api_base.clone(),
            model: config.openai_model.clone(),
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn build_body(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|err| AppError::ExternalAPI(format!("OpenAI request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            if detail.is_empty() {
                return Err(AppError::ExternalAPI(format!("OpenAI API error: {}", status)));
            }
            return Err(AppError::ExternalAPI(format!(
                "OpenAI API error: {} {}",
                status, detail
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| AppError::ExternalAPI(format!("OpenAI response parse failed: {}", err)))?;

        extract_reply(body)
    }
}

fn extract_reply(body: ChatResponse) -> Result<String> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::ExternalAPI("OpenAI response missing choices".to_string()))?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::ExternalAPI("OpenAI returned an empty reply".to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
