//! Gateway error taxonomy.

use thiserror::Error;

/// Failures surfaced by the LLM gateway after its internal retry budget is
/// spent. Only [`LlmError::is_retryable`] classes are ever retried.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("response contained no extractable JSON")]
    NoJson,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("response suppressed by provider content filter")]
    ContentFilter,
}

impl LlmError {
    /// Transient classes worth another attempt with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited | LlmError::Timeout | LlmError::Server { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(LlmError::RateLimited.is_retryable());
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Server { status: 500, body: String::new() }.is_retryable());
        assert!(!LlmError::Auth(401).is_retryable());
        assert!(!LlmError::ContentFilter.is_retryable());
        assert!(!LlmError::NoJson.is_retryable());
    }
}
