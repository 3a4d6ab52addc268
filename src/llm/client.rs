use crate::config::{
    AppConfig, DEFAULT_USER_AGENT, MESSAGES_PATH, VerbosityLevel,
};
use crate::llm::{
    LanguageModel,
    debug_logger::DebugLogger,
    error::{LlmError, LlmResult},
};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use url::Url;

/// Request body of the Messages API
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<&'a str>,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Response body of the Messages API; only text blocks are used
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Concatenated text of all text blocks
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    debug_logger: DebugLogger,
}

impl AnthropicClient {
    /// Create a client from the application configuration
    pub fn from_config(config: &AppConfig) -> crate::error::Result<Self> {
        let api_key = config.api_key()?;
        let llm = &config.llm;
        Ok(Self::with_config(
            api_key,
            &llm.base_url,
            &llm.api_version,
            llm.model.clone(),
            Duration::from_secs(llm.timeout_secs),
            llm.max_tokens,
            llm.temperature,
        )?
        .with_debug_logger(DebugLogger::new(VerbosityLevel::from(llm.verbosity_level))))
    }

    /// Create a client with explicit settings
    pub fn with_config(
        api_key: String,
        base_url: &str,
        api_version: &str,
        model: String,
        timeout: Duration,
        max_tokens: u32,
        temperature: f32,
    ) -> LlmResult<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API key cannot be empty".to_string()));
        }

        let url = messages_url(base_url)?;

        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(&api_key)
            .map_err(|_| LlmError::ConfigError("API key contains invalid characters".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-api-key"), key_value);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_str(api_version)
                .map_err(|_| LlmError::ConfigError(format!("Invalid API version: {api_version}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url,
            model,
            max_tokens,
            temperature,
            debug_logger: DebugLogger::default(),
        })
    }

    #[must_use]
    pub fn with_debug_logger(mut self, debug_logger: DebugLogger) -> Self {
        self.debug_logger = debug_logger;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the request body for one prompt
    pub fn request<'a>(&'a self, prompt: &'a str, stop: &[&'a str]) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop_sequences: stop.to_vec(),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }

    /// Send one prompt and return the completion text
    pub async fn send(&self, prompt: &str, stop: &[&str]) -> LlmResult<String> {
        let body = self.request(prompt, stop);
        let body_str = serde_json::to_string_pretty(&body)?;
        self.debug_logger.log_request(&self.url, &body_str);

        let started = Instant::now();
        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let text = response.text().await?;
        self.debug_logger
            .log_response(status.as_u16(), &text, started.elapsed().as_millis());

        if !status.is_success() {
            let err = LlmError::from_response(status.as_u16(), retry_after, &text);
            self.debug_logger.error(&format!("Request failed: {err}"));
            return Err(err);
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)?;
        self.debug_logger
            .debug(&format!("Stop reason: {:?}", parsed.stop_reason));
        let completion = parsed.text();
        if completion.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(completion)
    }
}

impl LanguageModel for AnthropicClient {
    fn complete(&self, prompt: &str, stop: &[&str]) -> impl Future<Output = LlmResult<String>> + Send {
        self.send(prompt, stop)
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"***")
            .finish()
    }
}

/// Validate the base URL and append the Messages path
fn messages_url(base_url: &str) -> LlmResult<String> {
    let parsed = Url::parse(base_url)
        .map_err(|e| LlmError::ConfigError(format!("Invalid base URL '{base_url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LlmError::ConfigError(format!(
            "Unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(format!("{}{}", base_url.trim_end_matches('/'), MESSAGES_PATH))
}
