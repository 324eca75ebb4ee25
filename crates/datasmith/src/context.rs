//! The per-run generation context.

use serde::{Deserialize, Serialize};

use datasmith_config::ProjectSpec;
use datasmith_core::{GeneratedCode, ParsedExamples, PlanSpec, ValidationResult};
use datasmith_llm::TokenUsage;

/// Pipeline position of a run. Every arrow in the state machine can fail;
/// `Fatal` is terminal alongside `Validated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    Parsed,
    Planned,
    Coded,
    Validated,
    Fatal,
}

/// One coder attempt and how its validation went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Everything one generation run accumulates, uniquely owned by the
/// orchestrator from load to completion.
#[derive(Debug)]
pub struct GenerationContext {
    pub spec: ProjectSpec,
    pub state: RunState,
    pub parsed: Option<ParsedExamples>,
    pub plan: Option<PlanSpec>,
    pub generated: Option<GeneratedCode>,
    pub validation: Option<ValidationResult>,
    pub attempts: Vec<AttemptRecord>,
    pub usage: TokenUsage,
}

impl GenerationContext {
    pub fn new(spec: ProjectSpec) -> Self {
        Self {
            spec,
            state: RunState::Init,
            parsed: None,
            plan: None,
            generated: None,
            validation: None,
            attempts: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    pub fn advance(&mut self, state: RunState) {
        tracing::debug!(from = ?self.state, to = ?state, "run state transition");
        self.state = state;
    }
}
