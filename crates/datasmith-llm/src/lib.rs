//! Structured, retrying chat-completions client.
//!
//! The gateway is the single outbound LLM client in the pipeline. It speaks
//! the OpenAI-compatible contract, enforces JSON mode when requested (with
//! a balanced-span + repair fallback for providers that ignore the request),
//! retries transient failures with exponential backoff, accounts tokens,
//! and serializes calls through a process-wide token-bucket rate limiter.
//!
//! # Architecture
//!
//! - Depends on: reqwest, serde, llm_json only
//! - Used by: datasmith-agent, datasmith (orchestrator)

mod error;
mod gateway;
mod json;
mod limiter;
mod types;

pub use error::LlmError;
pub use gateway::{ChatCall, ChatClient, ChatGateway, ChatOutcome, GatewayConfig};
pub use json::{extract_balanced, recover_json};
pub use limiter::RateLimiter;
pub use types::{ChatMessage, Role, TokenUsage};
