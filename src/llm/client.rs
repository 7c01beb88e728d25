//! Text-completion service boundary and its HTTP implementation.
//!
//! The pipeline only sees [`CompletionService`]; [`LlmClient`] is the
//! production implementation speaking the OpenAI Chat Completions and
//! Anthropic Messages APIs over reqwest. Tests substitute scripted fakes.
//!
//! Every call is a single request/response with a bounded output length
//! and a request timeout. Failures are never retried here.

use crate::config::Config;
use crate::otel::llm_span;
use crate::types::{FinqError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::Instrument;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction (role, schema, format constraints)
    pub system: Option<String>,

    /// User message
    pub user: String,

    /// Output length budget in tokens
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with a system instruction and a user message.
    pub fn with_system(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
            max_tokens,
        }
    }

    /// Request made of a single user prompt.
    pub fn user_only(user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            user: user.into(),
            max_tokens,
        }
    }
}

/// Token usage for cost monitoring.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenUsage {
    /// Number of tokens in the input (system prompt + user content)
    pub input_tokens: u32,

    /// Number of tokens in the output
    pub output_tokens: u32,

    /// Estimated cost in USD based on model pricing (0 when unknown)
    pub estimated_cost_usd: f64,

    /// Model name used for the request
    pub model: String,
}

/// Completion text plus usage when the provider reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Opaque text-completion service.
///
/// Constructed once at process start and shared by both synthesizers.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Completion` on transport, auth, rate-limit,
    /// timeout or response-format failures
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Infer provider from model name.
    ///
    /// `claude-*` and `anthropic*` go to Anthropic, everything else is
    /// treated as OpenAI-compatible.
    pub fn from_model(model: &str) -> Self {
        if model.starts_with("claude") || model.starts_with("anthropic") {
            Self::Anthropic
        } else {
            Self::OpenAI
        }
    }

    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_BASE_URL,
            Self::Anthropic => ANTHROPIC_BASE_URL,
        }
    }
}

/// OpenAI API response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Anthropic API response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// HTTP client for OpenAI and Anthropic completion APIs.
pub struct LlmClient {
    model: String,
    api_key: String,
    provider: LlmProvider,
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl LlmClient {
    /// Create new client.
    ///
    /// # Arguments
    ///
    /// * `model` - Model name (e.g., "gpt-4o", "claude-3-5-sonnet-20241022")
    /// * `api_key` - API key for the provider inferred from `model`
    /// * `timeout` - Bound on each completion call
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Config` if the HTTP client cannot be built
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let model = model.into();
        let provider = LlmProvider::from_model(&model);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FinqError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            model,
            api_key: api_key.into(),
            provider,
            base_url: provider.default_base_url().to_string(),
            timeout,
            client,
        })
    }

    /// Point the client at a different API root (OpenAI-compatible servers, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Config` if no API key is configured for the model's provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            FinqError::Config(format!(
                "{} not set. Export it or add api_key to the config file.",
                config.provider().api_key_var()
            ))
        })?;

        let client = Self::new(&config.model, api_key, Duration::from_secs(config.timeout_secs))?;

        Ok(match &config.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn transport_error(&self, provider: &str, e: reqwest::Error) -> FinqError {
        if e.is_timeout() {
            FinqError::Completion(format!(
                "{} API request timed out after {}s",
                provider,
                self.timeout.as_secs()
            ))
        } else {
            FinqError::Completion(format!("{} API error: {}", provider, e))
        }
    }

    /// Call OpenAI Chat Completions API.
    async fn call_openai(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user}));

        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| self.transport_error("OpenAI", e))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| self.transport_error("OpenAI", e))?;

        if !status.is_success() {
            return Err(FinqError::Completion(format!("OpenAI API error {}: {}", status, body)));
        }

        let parsed: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| FinqError::Completion(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = parsed.choices.into_iter().next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| FinqError::completion("No response from OpenAI"))?;

        let usage = parsed.usage
            .map(|u| self.usage(u.prompt_tokens, u.completion_tokens));

        Ok(Completion { text, usage })
    }

    /// Call Anthropic Messages API.
    async fn call_anthropic(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [
                {"role": "user", "content": request.user}
            ],
        });
        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }

        let response = self.client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("Anthropic", e))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| self.transport_error("Anthropic", e))?;

        if !status.is_success() {
            return Err(FinqError::Completion(format!("Anthropic API error {}: {}", status, body)));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| FinqError::Completion(format!("Failed to parse Anthropic response: {}", e)))?;

        let text = parsed.content.into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>();
        if text.is_empty() {
            return Err(FinqError::completion("No response from Anthropic"));
        }

        let usage = parsed.usage
            .map(|u| self.usage(u.input_tokens, u.output_tokens));

        Ok(Completion { text: text.concat(), usage })
    }

    fn usage(&self, input_tokens: u32, output_tokens: u32) -> TokenUsage {
        TokenUsage {
            input_tokens,
            output_tokens,
            estimated_cost_usd: self.calculate_cost(input_tokens, output_tokens),
            model: self.model.clone(),
        }
    }

    /// Calculate cost based on model pricing.
    ///
    /// # Pricing (per million tokens)
    ///
    /// | Model | Input | Output |
    /// |-------|-------|--------|
    /// | gpt-4o | $2.50 | $10.00 |
    /// | gpt-4o-mini | $0.15 | $0.60 |
    /// | claude-3-5-haiku | $0.80 | $4.00 |
    /// | claude-3-5-sonnet | $3.00 | $15.00 |
    fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let (input_cost_per_mtok, output_cost_per_mtok) = match self.model.as_str() {
            m if m.starts_with("gpt-4o-mini") => (0.15, 0.60),
            m if m.starts_with("gpt-4o") => (2.5, 10.0),
            m if m.starts_with("claude-3-5-haiku") => (0.8, 4.0),
            m if m.starts_with("claude-3-5-sonnet") => (3.0, 15.0),
            _ => {
                tracing::debug!(
                    model = %self.model,
                    "Unknown model pricing - cost calculation will be 0"
                );
                (0.0, 0.0)
            }
        };

        let input_cost = (input_tokens as f64 / 1_000_000.0) * input_cost_per_mtok;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * output_cost_per_mtok;

        input_cost + output_cost
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let span = llm_span(&self.model, request.max_tokens);
        async {
            let completion = match self.provider {
                LlmProvider::OpenAI => self.call_openai(&request).await?,
                LlmProvider::Anthropic => self.call_anthropic(&request).await?,
            };

            if let Some(usage) = &completion.usage {
                tracing::info!(
                    model = %usage.model,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    cost_usd = usage.estimated_cost_usd,
                    "LLM request completed"
                );
            }

            Ok::<_, FinqError>(completion)
        }
        .instrument(span)
        .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
