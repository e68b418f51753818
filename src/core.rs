//! Conversation model and async VLM client for clevreval

use crate::error::{ClevrEvalError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

/// Represents an image in a prompt - either base64 encoded or raw image data
#[derive(Debug, Clone)]
pub enum PromptImage {
    Base64(String),
    Image(DynamicImage),
}

impl PromptImage {
    /// Encode the image to base64 data URL format
    pub fn to_data_url(&self) -> Result<String> {
        match self {
            PromptImage::Base64(s) => {
                if s.starts_with("data:") {
                    Ok(s.clone())
                } else {
                    Ok(format!("data:image/png;base64,{}", s))
                }
            }
            PromptImage::Image(img) => {
                let rgb_img = img.to_rgb8();
                let mut buffer = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut buffer);
                rgb_img.write_to(&mut cursor, image::ImageFormat::Png)?;
                let encoded = BASE64.encode(&buffer);
                Ok(format!("data:image/png;base64,{}", encoded))
            }
        }
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One piece of turn content - a text segment or an image reference
#[derive(Debug, Clone)]
pub enum ContentPart {
    Text(String),
    Image(PromptImage),
}

/// A single conversation turn
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

/// Ordered turn sequence forming the model's input context.
///
/// Built fresh per query: one system turn first, optional alternating
/// few-shot user/assistant pairs, and a final user turn carrying the live
/// image and question.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_system(&mut self, text: &str) {
        self.turns.push(Turn {
            role: Role::System,
            parts: vec![ContentPart::Text(text.to_string())],
        });
    }

    pub fn push_user_text(&mut self, text: &str) {
        self.turns.push(Turn {
            role: Role::User,
            parts: vec![ContentPart::Text(text.to_string())],
        });
    }

    pub fn push_user_with_image(&mut self, image: PromptImage, text: &str) {
        self.turns.push(Turn {
            role: Role::User,
            parts: vec![
                ContentPart::Image(image),
                ContentPart::Text(text.to_string()),
            ],
        });
    }

    pub fn push_assistant_text(&mut self, text: &str) {
        self.turns.push(Turn {
            role: Role::Assistant,
            parts: vec![ContentPart::Text(text.to_string())],
        });
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APIConfig {
    pub url: String,
    pub model: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub api_key: Option<String>,
}

fn default_seed() -> u64 {
    42
}
fn default_timeout() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}

impl APIConfig {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url,
            model,
            seed: 42,
            timeout_seconds: 120,
            max_retries: 3,
            api_key: None,
        }
    }

    /// Parse from key=value format string
    pub fn from_model_args(args: &str) -> Result<Self> {
        let mut url = None;
        let mut model = None;
        let mut seed = 42u64;
        let mut timeout = 120u64;
        let mut max_retries = 3u32;
        let mut api_key = None;

        for part in args.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ClevrEvalError::InvalidModelArgs(format!("Invalid format: {}", part)))?;

            match key.trim() {
                "base_url" => url = Some(value.trim().to_string()),
                "model" => model = Some(value.trim().to_string()),
                "seed" => {
                    seed = value
                        .trim()
                        .parse()
                        .map_err(|_| ClevrEvalError::ParseError(format!("Invalid seed: {}", value)))?
                }
                "timeout" => {
                    timeout = value.trim().parse().map_err(|_| {
                        ClevrEvalError::ParseError(format!("Invalid timeout: {}", value))
                    })?
                }
                "max_retries" => {
                    max_retries = value.trim().parse().map_err(|_| {
                        ClevrEvalError::ParseError(format!("Invalid max_retries: {}", value))
                    })?
                }
                "api_key" => api_key = Some(value.trim().to_string()),
                _ => {} // Ignore unknown keys
            }
        }

        let url = url.ok_or_else(|| ClevrEvalError::MissingField("base_url".to_string()))?;
        let model = model.ok_or_else(|| ClevrEvalError::MissingField("model".to_string()))?;

        Ok(Self {
            url: format!("{}/chat/completions", url.trim_end_matches('/')),
            model,
            seed,
            timeout_seconds: timeout,
            max_retries,
            api_key,
        })
    }
}

/// Generation kwargs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenKwargs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl GenKwargs {
    /// Parse from key=value format string
    pub fn from_str(args: &str) -> Result<Self> {
        let mut kwargs = GenKwargs::default();

        for part in args.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ClevrEvalError::ParseError(format!("Invalid format: {}", part)))?;

            let key = key.trim();
            let value = value.trim();

            match key {
                "temperature" => {
                    kwargs.temperature = Some(value.parse().map_err(|_| {
                        ClevrEvalError::ParseError(format!("Invalid temperature: {}", value))
                    })?)
                }
                "max_tokens" => {
                    kwargs.max_tokens = Some(value.parse().map_err(|_| {
                        ClevrEvalError::ParseError(format!("Invalid max_tokens: {}", value))
                    })?)
                }
                "top_p" => {
                    kwargs.top_p = Some(value.parse().map_err(|_| {
                        ClevrEvalError::ParseError(format!("Invalid top_p: {}", value))
                    })?)
                }
                _ => {
                    // Try to parse as JSON value
                    let json_value: serde_json::Value = serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
                    kwargs.extra.insert(key.to_string(), json_value);
                }
            }
        }

        Ok(kwargs)
    }
}

/// OpenAI chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: serde_json::Value,
}

impl ChatMessage {
    /// Convert a conversation turn into wire format.
    ///
    /// Single-text turns become plain string content; turns carrying images
    /// become part arrays with image_url data URLs.
    pub fn from_turn(turn: &Turn) -> Result<Self> {
        if let [ContentPart::Text(text)] = turn.parts.as_slice() {
            return Ok(Self {
                role: turn.role.as_str().to_string(),
                content: serde_json::Value::String(text.clone()),
            });
        }

        let mut content = Vec::new();
        for part in &turn.parts {
            match part {
                ContentPart::Text(text) => content.push(serde_json::json!({
                    "type": "text",
                    "text": text
                })),
                ContentPart::Image(image) => content.push(serde_json::json!({
                    "type": "image_url",
                    "image_url": {
                        "url": image.to_data_url()?
                    }
                })),
            }
        }

        Ok(Self {
            role: turn.role.as_str().to_string(),
            content: serde_json::Value::Array(content),
        })
    }
}

/// OpenAI chat completion request
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(flatten)]
    extra: std::collections::HashMap<String, serde_json::Value>,
}

/// OpenAI chat completion response
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// External generation capability: a conversation and a token budget in,
/// generated text out. The evaluation loop only depends on this trait, so
/// it can run against a deterministic stub in tests.
#[async_trait]
pub trait VlmBackend: Send + Sync {
    async fn generate(&self, conversation: &Conversation, max_new_tokens: u32) -> Result<String>;
}

/// Async client for OpenAI-compatible chat completion APIs
pub struct ApiClient {
    client: Client,
    config: APIConfig,
    gen_kwargs: GenKwargs,
}

impl ApiClient {
    pub fn new(config: APIConfig, gen_kwargs: GenKwargs) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            config,
            gen_kwargs,
        }
    }

    /// Send a single chat completion request with retries
    async fn complete_one(
        &self,
        conversation: &Conversation,
        max_new_tokens: u32,
    ) -> Result<String> {
        let messages = conversation
            .turns
            .iter()
            .map(ChatMessage::from_turn)
            .collect::<Result<Vec<_>>>()?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.gen_kwargs.temperature,
            max_tokens: Some(self.gen_kwargs.max_tokens.unwrap_or(max_new_tokens)),
            top_p: self.gen_kwargs.top_p,
            seed: Some(self.config.seed),
            extra: self.gen_kwargs.extra.clone(),
        };

        let mut last_error = None;
        let mut delay = Duration::from_secs(1);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(8));
            }

            let mut req = self.client.post(&self.config.url).json(&request);

            if let Some(ref api_key) = self.config.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body: ChatCompletionResponse = response.json().await?;
                        if let Some(choice) = body.choices.first() {
                            return Ok(choice.message.content.clone());
                        }
                        return Err(ClevrEvalError::ApiError("No choices in response".to_string()));
                    }

                    if status.as_u16() == 429 {
                        last_error = Some(ClevrEvalError::RateLimited(delay.as_secs()));
                        continue;
                    }

                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ClevrEvalError::ApiError(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ClevrEvalError::Timeout(self.config.timeout_seconds));
                        continue;
                    }
                    last_error = Some(ClevrEvalError::HttpError(e));
                }
            }
        }

        Err(ClevrEvalError::MaxRetriesExceeded(
            self.config.max_retries,
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl VlmBackend for ApiClient {
    async fn generate(&self, conversation: &Conversation, max_new_tokens: u32) -> Result<String> {
        self.complete_one(conversation, max_new_tokens).await
    }
}
