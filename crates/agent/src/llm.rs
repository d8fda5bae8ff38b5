use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

use tutur_core::config::{LlmConfig, LlmProvider};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Retries apply to transport failures, `429` and `5xx` answers. The delay
/// doubles after every attempt unless the provider sends `Retry-After`.
/// Either way a single wait never exceeds `max_delay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }

    fn delay_for(&self, attempt: u32, requested: Option<Duration>) -> Duration {
        requested
            .unwrap_or_else(|| self.initial_backoff.saturating_mul(2_u32.saturating_pow(attempt)))
            .min(self.max_delay)
    }
}

struct HttpTransport {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpTransport {
    fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, retry })
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&SecretString>,
        body: &Value,
    ) -> Result<Value> {
        let mut attempt = 0;

        loop {
            let mut request = self.client.post(url).json(body);
            if let Some(key) = bearer {
                request = request.bearer_auth(key.expose_secret());
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(error) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt, None);
                    warn!(
                        event_name = "llm.request.retry",
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "llm transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(error) => {
                    return Err(error).with_context(|| format!("llm request to {url} failed"));
                }
            };

            let status = response.status();
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.retry.max_retries {
                let delay = self.retry.delay_for(attempt, retry_after(response.headers()));
                warn!(
                    event_name = "llm.request.retry",
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    status = status.as_u16(),
                    "llm provider answered with a retryable status"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.context("failed to read llm response body")?;
            if !status.is_success() {
                bail!("llm provider returned HTTP {status}: {}", api_message(&text));
            }

            return serde_json::from_str(&text).context("llm response is not valid JSON");
        }
    }
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error")?;
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn user_message(prompt: &str) -> Value {
    json!([{ "role": "user", "content": prompt }])
}

/// Chat completions against OpenAI or any server speaking the same protocol.
pub struct OpenAiCompatibleClient {
    transport: HttpTransport,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(timeout, retry)?,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        })
    }

    fn chat_url(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.ends_with("/chat/completions") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/chat/completions")
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": user_message(prompt),
            "temperature": 0,
        });
        let response = self.transport.post_json(&self.chat_url(), Some(&self.api_key), &body).await?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("chat completion response has no message content"))
    }
}

/// Ollama's native `/api/chat` endpoint, non-streaming.
pub struct OllamaClient {
    transport: HttpTransport,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(timeout, retry)?,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": user_message(prompt),
            "stream": false,
            "options": { "temperature": 0 },
        });
        let response = self.transport.post_json(&url, None, &body).await?;

        response
            .pointer("/message/content")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("ollama response has no message content"))
    }
}

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let retry = RetryPolicy::new(config.max_retries);

    match config.provider {
        LlmProvider::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("llm.api_key is required for the openai provider"))?;
            let base_url =
                config.base_url.clone().unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
            Ok(Arc::new(OpenAiCompatibleClient::new(
                base_url,
                api_key,
                config.model.clone(),
                timeout,
                retry,
            )?))
        }
        LlmProvider::Ollama => {
            let base_url =
                config.base_url.clone().unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string());
            Ok(Arc::new(OllamaClient::new(base_url, config.model.clone(), timeout, retry)?))
        }
    }
}
