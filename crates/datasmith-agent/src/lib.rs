//! The dual-mode agent: two LLM personas sharing one gateway.
//!
//! The **Planner** turns parsed examples into a structured [`PlanSpec`]
//! (JSON mode, low temperature). The **Coder** turns the plan into a
//! delimited multi-file artifact set. Both validate what came back and
//! retry once with the error appended; the orchestrator owns any further
//! retry budget. Cancellation is cooperative: the flag is polled before
//! every gateway call and between retries.

mod envelope;

use std::sync::Arc;

use thiserror::Error;

use datasmith_config::ProjectSpec;
use datasmith_core::{CancellationToken, GeneratedCode, ParsedExamples, PlanSpec};
use datasmith_enforce::EnforceConfig;
use datasmith_llm::{ChatCall, ChatClient, ChatMessage, LlmError};
use datasmith_prompt::{
    build_coder_prompt, build_planner_prompt, CODER_SYSTEM_PROMPT, PLANNER_SYSTEM_PROMPT,
};

pub use envelope::parse_artifacts;

/// Focused temperature for planning; the coder runs at the project's
/// configured temperature.
const PLAN_TEMPERATURE: f64 = 0.1;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("run cancelled")]
    Cancelled,

    #[error("planner output invalid after repair retry: {detail}")]
    InvalidPlan { detail: String },

    #[error("coder output unparseable: {detail}")]
    InvalidArtifacts { detail: String },
}

/// Two personas, one gateway.
pub struct Agent {
    client: Arc<dyn ChatClient>,
    enforce: EnforceConfig,
    cancel: CancellationToken,
}

impl Agent {
    pub fn new(client: Arc<dyn ChatClient>, enforce: EnforceConfig) -> Self {
        Self {
            client,
            enforce,
            cancel: CancellationToken::new(),
        }
    }

    /// Install a cancellation flag shared with the orchestrator.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn check_cancelled(&self) -> Result<(), AgentError> {
        if self.cancel.is_cancelled() {
            Err(AgentError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Planner persona: parsed examples in, validated plan out.
    pub async fn plan(
        &self,
        parsed: &ParsedExamples,
        spec: &ProjectSpec,
    ) -> Result<PlanSpec, AgentError> {
        let prompt = build_planner_prompt(parsed, spec);
        let mut messages = vec![
            ChatMessage::system(PLANNER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        self.check_cancelled()?;
        let outcome = self
            .client
            .chat(self.call(messages.clone(), PLAN_TEMPERATURE, true, spec))
            .await?;

        match validate_plan(&outcome.text) {
            Ok(plan) => Ok(plan),
            Err(detail) => {
                tracing::warn!(%detail, "plan rejected; repair retry");
                messages.push(ChatMessage::assistant(outcome.text));
                messages.push(ChatMessage::user(format!(
                    "Your previous output was not a valid JSON plan of the \
                     requested shape. Error: {detail}. Emit only the corrected \
                     JSON object, nothing else."
                )));
                self.check_cancelled()?;
                let retry = self
                    .client
                    .chat(self.call(messages, PLAN_TEMPERATURE, true, spec))
                    .await?;
                validate_plan(&retry.text).map_err(|detail| AgentError::InvalidPlan { detail })
            }
        }
    }

    /// Coder persona: plan in, parsed artifact set out. `feedback` carries
    /// the previous attempt's validation violations, when retrying.
    pub async fn code(
        &self,
        plan: &PlanSpec,
        parsed: &ParsedExamples,
        spec: &ProjectSpec,
        feedback: Option<&str>,
    ) -> Result<GeneratedCode, AgentError> {
        let prompt = build_coder_prompt(plan, parsed, spec, &self.enforce);
        let mut messages = vec![
            ChatMessage::system(CODER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        if let Some(feedback) = feedback {
            messages.push(ChatMessage::user(format!(
                "Your previous attempt failed validation. Fix every item and \
                 re-emit all three files in full.\n\n{feedback}"
            )));
        }

        self.check_cancelled()?;
        let outcome = self
            .client
            .chat(self.call(messages.clone(), spec.runtime.temperature, false, spec))
            .await?;

        match parse_artifacts(&outcome.text) {
            Ok(code) => Ok(code),
            Err(AgentError::InvalidArtifacts { detail }) => {
                tracing::warn!(%detail, "artifact envelope rejected; repair retry");
                messages.push(ChatMessage::assistant(outcome.text));
                messages.push(ChatMessage::user(format!(
                    "Your previous output could not be split into files: \
                     {detail}. Re-emit all artifacts, each introduced by its \
                     `=== path ===` header line."
                )));
                self.check_cancelled()?;
                let retry = self
                    .client
                    .chat(self.call(messages, spec.runtime.temperature, false, spec))
                    .await?;
                parse_artifacts(&retry.text)
            }
            Err(other) => Err(other),
        }
    }

    /// Plan then code, for callers that do not interleave validation.
    pub async fn plan_and_code(
        &self,
        parsed: &ParsedExamples,
        spec: &ProjectSpec,
    ) -> Result<(PlanSpec, GeneratedCode), AgentError> {
        let plan = self.plan(parsed, spec).await?;
        let code = self.code(&plan, parsed, spec, None).await?;
        Ok((plan, code))
    }

    fn call(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f64,
        json_mode: bool,
        spec: &ProjectSpec,
    ) -> ChatCall {
        ChatCall {
            messages,
            model: spec.runtime.model.clone(),
            temperature,
            max_tokens: spec.runtime.max_tokens,
            json_mode,
        }
    }
}

/// Deserialize and structurally check a planner reply.
fn validate_plan(text: &str) -> Result<PlanSpec, String> {
    if text.trim().is_empty() {
        return Err("empty response".to_string());
    }
    let plan: PlanSpec = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let missing = plan.missing_sections();
    if !missing.is_empty() {
        return Err(format!("missing sections: {}", missing.join(", ")));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasmith_examples::parse_examples;
    use datasmith_llm::ChatOutcome;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A gateway stub that replays scripted responses and records calls.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<ChatOutcome, LlmError>>>,
        calls: Mutex<Vec<ChatCall>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<ChatOutcome, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn reply(text: &str) -> Result<ChatOutcome, LlmError> {
            Ok(ChatOutcome {
                text: text.to_string(),
                usage: datasmith_llm::TokenUsage::default(),
                finish_reason: "stop".to_string(),
                request_id: uuid::Uuid::new_v4(),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ChatClient for ScriptedClient {
        async fn chat(&self, call: ChatCall) -> Result<ChatOutcome, LlmError> {
            self.calls.lock().unwrap().push(call);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
        }
    }

    fn spec() -> ProjectSpec {
        ProjectSpec::load(
            r#"
project: {name: t}
data_sources: [{type: url, url: "https://x.test"}]
examples:
  - {input: {a: "1"}, output: {b: 1}}
  - {input: {a: "2"}, output: {b: 2}}
output: [{format: json}]
"#,
        )
        .unwrap()
    }

    const GOOD_PLAN: &str = r#"{"strategy": "rename a to b and cast",
        "modules": [{"name": "extractor", "purpose": "p", "classes": ["TExtractor"]}],
        "classes": [{"name": "TExtractor", "bases": ["BaseExtractor"],
                     "methods": ["extract"], "fields": []}],
        "imports": ["typing"], "error_handling_notes": "n", "test_outline": "o"}"#;

    const GOOD_CODE: &str = "=== extractor.py ===\nclass TExtractor: ...\n\
                             \n=== models.py ===\nRecord = dict\n\
                             \n=== test_extractor.py ===\ndef t() -> None: ...\n";

    fn agent(client: Arc<ScriptedClient>) -> Agent {
        Agent::new(client, EnforceConfig::default())
    }

    #[tokio::test]
    async fn test_plan_happy_path() {
        let client = ScriptedClient::new(vec![ScriptedClient::reply(GOOD_PLAN)]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let plan = agent(client.clone()).plan(&parsed, &spec).await.unwrap();
        assert_eq!(plan.classes[0].name, "TExtractor");
        assert_eq!(client.call_count(), 1);
        // planner runs in JSON mode at focused temperature
        let call = &client.calls.lock().unwrap()[0];
        assert!(call.json_mode);
        assert!(call.temperature < spec.runtime.temperature + 1e-9);
    }

    #[tokio::test]
    async fn test_plan_repairs_once_then_succeeds() {
        let client = ScriptedClient::new(vec![
            ScriptedClient::reply(r#"{"strategy": ""}"#),
            ScriptedClient::reply(GOOD_PLAN),
        ]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let plan = agent(client.clone()).plan(&parsed, &spec).await.unwrap();
        assert!(!plan.strategy.is_empty());
        assert_eq!(client.call_count(), 2);
        // the repair turn carries the previous output and the error
        let calls = client.calls.lock().unwrap();
        let last_messages = &calls[1].messages;
        assert!(last_messages.len() > 2);
        assert!(last_messages
            .last()
            .unwrap()
            .content
            .contains("missing sections"));
    }

    #[tokio::test]
    async fn test_plan_fails_after_second_bad_reply() {
        let client = ScriptedClient::new(vec![
            ScriptedClient::reply("not json"),
            ScriptedClient::reply("still not json"),
        ]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let err = agent(client).plan(&parsed, &spec).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidPlan { .. }));
    }

    #[tokio::test]
    async fn test_code_happy_path_and_feedback() {
        let client = ScriptedClient::new(vec![ScriptedClient::reply(GOOD_CODE)]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let plan: PlanSpec = serde_json::from_str(GOOD_PLAN).unwrap();
        let code = agent(client.clone())
            .code(&plan, &parsed, &spec, Some("DANGEROUS_FUNCTION at line 3"))
            .await
            .unwrap();
        assert_eq!(code.files.len(), 3);
        let calls = client.calls.lock().unwrap();
        assert!(calls[0]
            .messages
            .iter()
            .any(|m| m.content.contains("DANGEROUS_FUNCTION")));
        assert!(!calls[0].json_mode);
    }

    #[tokio::test]
    async fn test_code_envelope_repair_retry() {
        let client = ScriptedClient::new(vec![
            ScriptedClient::reply("no sections here"),
            ScriptedClient::reply(GOOD_CODE),
        ]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let plan: PlanSpec = serde_json::from_str(GOOD_PLAN).unwrap();
        let code = agent(client.clone())
            .code(&plan, &parsed, &spec, None)
            .await
            .unwrap();
        assert_eq!(code.files.len(), 3);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_blocks_calls() {
        let client = ScriptedClient::new(vec![ScriptedClient::reply(GOOD_PLAN)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let agent = agent(client.clone()).with_cancellation(cancel);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let err = agent.plan(&parsed, &spec).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_and_code_threads_both_personas() {
        let client = ScriptedClient::new(vec![
            ScriptedClient::reply(GOOD_PLAN),
            ScriptedClient::reply(GOOD_CODE),
        ]);
        let spec = spec();
        let parsed = parse_examples(&spec.examples);
        let (plan, code) = agent(client).plan_and_code(&parsed, &spec).await.unwrap();
        assert_eq!(plan.modules[0].name, "extractor");
        assert_eq!(code.files.len(), 3);
    }
}
