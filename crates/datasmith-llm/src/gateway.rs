//! The outbound chat-completions client.

use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::error::LlmError;
use crate::json::recover_json;
use crate::limiter::RateLimiter;
use crate::types::{
    ChatMessage, CompletionRequest, CompletionResponse, ResponseFormat, TokenUsage, Usage,
};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Endpoint base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: String,
    /// Transport-level retry budget (attempts = retries + 1).
    pub max_retries: u32,
    /// First backoff step; doubles per attempt, plus jitter.
    pub backoff_base: Duration,
    pub request_timeout: Duration,
    /// Requests per second for the shared rate bucket.
    pub rate_limit_rps: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            request_timeout: Duration::from_secs(60),
            rate_limit_rps: 2.0,
        }
    }
}

/// One chat call.
#[derive(Debug, Clone)]
pub struct ChatCall {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request the provider's structured-output mode and post-process the
    /// reply down to a JSON payload.
    pub json_mode: bool,
}

/// A completed chat call.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub text: String,
    pub usage: TokenUsage,
    pub finish_reason: String,
    pub request_id: Uuid,
}

/// The outbound chat seam. The production implementation is
/// [`ChatGateway`]; tests script their own.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, call: ChatCall) -> Result<ChatOutcome, LlmError>;

    /// Cumulative token accounting, when the implementation tracks it.
    fn usage(&self) -> TokenUsage {
        TokenUsage::default()
    }
}

#[async_trait::async_trait]
impl ChatClient for ChatGateway {
    async fn chat(&self, call: ChatCall) -> Result<ChatOutcome, LlmError> {
        ChatGateway::chat(self, call).await
    }

    fn usage(&self) -> TokenUsage {
        self.total_usage()
    }
}

/// The single outbound chat-completions client. Re-entrant: independent
/// generation runs may share one gateway; the rate bucket serializes them.
pub struct ChatGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    limiter: RateLimiter,
    usage: std::sync::Mutex<TokenUsage>,
}

impl ChatGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        let limiter = RateLimiter::new(config.rate_limit_rps);
        Ok(Self {
            http,
            config,
            limiter,
            usage: std::sync::Mutex::new(TokenUsage::default()),
        })
    }

    /// Tokens consumed by every call through this gateway so far.
    pub fn total_usage(&self) -> TokenUsage {
        *self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send one chat call, retrying transient failures with exponential
    /// backoff and jitter. Auth, content-filter, and non-429 client errors
    /// fail immediately.
    pub async fn chat(&self, call: ChatCall) -> Result<ChatOutcome, LlmError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let mut attempt = 0u32;
        let outcome = loop {
            self.limiter.acquire().await;
            match self.send_once(&call).await {
                Ok(outcome) => break outcome,
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        %request_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient gateway error; backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let (text, usage, finish_reason) = outcome;
        {
            let mut total = self
                .usage
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            total.add(&usage);
        }

        let text = if call.json_mode {
            recover_json(&text).ok_or(LlmError::NoJson)?
        } else {
            text
        };

        tracing::info!(
            %request_id,
            model = %call.model,
            duration_ms = started.elapsed().as_millis() as u64,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            finish_reason = %finish_reason,
            "chat completion"
        );

        Ok(ChatOutcome {
            text,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
            finish_reason,
            request_id,
        })
    }

    async fn send_once(&self, call: &ChatCall) -> Result<(String, Usage, String), LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = CompletionRequest {
            model: call.model.clone(),
            messages: call.messages.clone(),
            temperature: Some(call.temperature),
            max_tokens: Some(call.max_tokens),
            response_format: call.json_mode.then(ResponseFormat::json_object),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("malformed response body: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Transport("response carried no choices".to_string()))?;
        let finish_reason = choice.finish_reason.unwrap_or_else(|| "stop".to_string());
        if finish_reason == "content_filter" {
            return Err(LlmError::ContentFilter);
        }

        Ok((
            choice.message.content.unwrap_or_default(),
            parsed.usage.unwrap_or_default(),
            finish_reason,
        ))
    }

    /// `base · 2^attempt` plus up to half a base step of jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base;
        let exp = base.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis().max(1) as u64 / 2);
        exp + Duration::from_millis(jitter_ms)
    }
}

/// Map an HTTP status to the error taxonomy: 401/403 auth, 429 rate, 5xx
/// server (retryable), anything else transport (fail fast).
pub(crate) fn classify_status(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Auth(status),
        429 => LlmError::RateLimited,
        500..=599 => LlmError::Server { status, body },
        _ => LlmError::Transport(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(classify_status(401, String::new()), LlmError::Auth(401)));
        assert!(matches!(classify_status(429, String::new()), LlmError::RateLimited));
        assert!(matches!(
            classify_status(503, String::new()),
            LlmError::Server { status: 503, .. }
        ));
        assert!(matches!(
            classify_status(400, String::new()),
            LlmError::Transport(_)
        ));
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let gateway = ChatGateway::new(GatewayConfig {
            backoff_base: Duration::from_millis(100),
            ..GatewayConfig::default()
        })
        .unwrap();
        let first = gateway.backoff_delay(0);
        let third = gateway.backoff_delay(2);
        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(150));
        assert!(third >= Duration::from_millis(400));
        assert!(third <= Duration::from_millis(450));
    }
}
