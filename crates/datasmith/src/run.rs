//! The generator orchestrator: drives the pipeline and owns the retry loop.
//!
//! ```text
//! INIT
//!  └─> PARSED            (example parser success)
//!       └─> PLANNED      (planner success, JSON valid)
//!            └─> CODED   (coder success, artifacts parsed)
//!                 └─> VALIDATED    (no error-severity violations)
//!                 └─> INVALID      -> feedback -> CODED' (retry <= R)
//!                 └─> FATAL        (R exhausted)
//! ```
//!
//! The orchestrator never recovers silently from an error-severity
//! violation: it either retries with the violations attached to the coder
//! prompt (while the counter permits) or fails with the full list
//! preserved.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use datasmith_agent::Agent;
use datasmith_config::{validate_comprehensive, ProjectSpec, ValidationRules};
use datasmith_core::{CancellationToken, Severity, ValidationResult, Violation};
use datasmith_enforce::{validate_code, EnforceConfig};
use datasmith_examples::parse_examples;
use datasmith_llm::ChatClient;

use crate::artifacts::{write_artifacts, write_metadata, RunMetadata, ValidationSummary};
use crate::context::{AttemptRecord, GenerationContext, RunState};
use crate::error::GenerateError;

/// A finished run: the context plus what landed on disk.
#[derive(Debug)]
pub struct RunOutcome {
    pub context: GenerationContext,
    pub artifact_paths: Vec<PathBuf>,
    pub metadata_path: PathBuf,
}

/// Drives one generation run end to end.
pub struct Generator {
    client: Arc<dyn ChatClient>,
    project_root: PathBuf,
    cancel: CancellationToken,
}

impl Generator {
    pub fn new(client: Arc<dyn ChatClient>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            project_root: project_root.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Share a cancellation flag with the caller (signal handler, UI).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full pipeline for one project spec.
    pub async fn run(&self, spec: ProjectSpec) -> Result<RunOutcome, GenerateError> {
        let started = Instant::now();
        let budget = Duration::from_secs(spec.runtime.run_budget_secs);
        let max_retries = spec.runtime.max_retries;
        let enforce = merge_validation_rules(EnforceConfig::default(), spec.validation.as_ref());

        let report = validate_comprehensive(&spec);
        for warning in &report.warnings {
            tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }
        if !report.is_ok() {
            return Err(GenerateError::SpecInvalid(report));
        }

        let mut ctx = GenerationContext::new(spec);
        let agent = Agent::new(self.client.clone(), enforce.clone())
            .with_cancellation(self.cancel.clone());

        // INIT -> PARSED
        self.checkpoint(started, budget, "parsing")?;
        let parsed = parse_examples(&ctx.spec.examples);
        if parsed.input_schema.is_empty() {
            ctx.advance(RunState::Fatal);
            return Err(GenerateError::NothingToLearn);
        }
        ctx.parsed = Some(parsed);
        ctx.advance(RunState::Parsed);

        // PARSED -> PLANNED (the agent owns its single repair retry)
        self.checkpoint(started, budget, "planning")?;
        let plan = agent
            .plan(ctx.parsed.as_ref().unwrap(), &ctx.spec)
            .await
            .map_err(|e| self.fatal(&mut ctx, e))?;
        ctx.plan = Some(plan);
        ctx.advance(RunState::Planned);

        // PLANNED -> CODED -> VALIDATED, looping through CODED on failure
        let mut feedback: Option<String> = None;
        let mut attempt = 0u32;
        loop {
            self.checkpoint(started, budget, "coding")?;
            let code = agent
                .code(
                    ctx.plan.as_ref().unwrap(),
                    ctx.parsed.as_ref().unwrap(),
                    &ctx.spec,
                    feedback.as_deref(),
                )
                .await
                .map_err(|e| self.fatal(&mut ctx, e))?;
            ctx.advance(RunState::Coded);

            self.checkpoint(started, budget, "validation")?;
            let result = validate_generated(&code, &enforce);
            ctx.attempts.push(AttemptRecord {
                attempt,
                valid: result.valid,
                error_count: result.error_count(),
                warning_count: result.warning_count(),
            });

            if result.valid {
                ctx.generated = Some(code);
                ctx.validation = Some(result);
                ctx.advance(RunState::Validated);
                break;
            }

            tracing::warn!(
                attempt,
                errors = result.error_count(),
                "generated code failed validation"
            );
            if attempt >= max_retries {
                ctx.generated = Some(code);
                ctx.advance(RunState::Fatal);
                return Err(GenerateError::ValidationFailed {
                    attempts: attempt + 1,
                    result,
                });
            }
            feedback = Some(render_feedback(&result));
            ctx.validation = Some(result);
            attempt += 1;
        }

        // Side effects only for a completed, uncancelled run.
        if self.cancel.is_cancelled() {
            ctx.advance(RunState::Fatal);
            return Err(GenerateError::Cancelled);
        }
        ctx.usage = self.client.usage();
        let timestamp = Utc::now();
        let artifact_paths = write_artifacts(
            &self.project_root,
            &ctx.spec.project.name,
            ctx.generated.as_ref().unwrap(),
            &ctx.spec.runtime.model,
            timestamp,
        )?;
        let metadata_path = write_metadata(
            &self.project_root,
            &RunMetadata {
                timestamp,
                model: ctx.spec.runtime.model.clone(),
                tokens: ctx.usage,
                duration_ms: started.elapsed().as_millis() as u64,
                validation_summary: ValidationSummary::from_result(
                    ctx.validation.as_ref().unwrap(),
                ),
            },
        )?;

        tracing::info!(
            project = %ctx.spec.project.name,
            attempts = ctx.attempts.len(),
            artifacts = artifact_paths.len(),
            "generation run complete"
        );

        Ok(RunOutcome {
            context: ctx,
            artifact_paths,
            metadata_path,
        })
    }

    fn checkpoint(
        &self,
        started: Instant,
        budget: Duration,
        phase: &'static str,
    ) -> Result<(), GenerateError> {
        if self.cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        if started.elapsed() > budget {
            return Err(GenerateError::BudgetExhausted {
                budget_secs: budget.as_secs(),
                phase,
            });
        }
        Ok(())
    }

    fn fatal(&self, ctx: &mut GenerationContext, err: datasmith_agent::AgentError) -> GenerateError {
        ctx.advance(RunState::Fatal);
        err.into()
    }
}

/// Validate every generated file and merge the findings, prefixing each
/// message with its file. Violations stay in per-file source-line order.
pub fn validate_generated(
    code: &datasmith_core::GeneratedCode,
    config: &EnforceConfig,
) -> ValidationResult {
    let mut violations: Vec<Violation> = Vec::new();
    let mut duration_ms = 0u64;
    for (path, source) in &code.files {
        let result = validate_code(source, config);
        duration_ms += result.duration_ms;
        violations.extend(result.violations.into_iter().map(|mut v| {
            v.message = format!("{}: {}", path, v.message);
            v
        }));
    }
    let valid = !violations.iter().any(|v| v.severity == Severity::Error);
    ValidationResult {
        valid,
        violations,
        duration_ms,
    }
}

/// Render violations as coder feedback, line by line with suggestions.
fn render_feedback(result: &ValidationResult) -> String {
    let mut out = String::from("Validation findings:\n");
    for v in &result.violations {
        out.push_str(&format!(
            "- [{}] {} (line {}){}\n",
            v.code,
            v.message,
            v.line,
            v.suggestion
                .as_deref()
                .map(|s| format!(" — {s}"))
                .unwrap_or_default()
        ));
    }
    out
}

/// Overlay the project spec's validation rules on the enforcer defaults.
pub fn merge_validation_rules(
    mut base: EnforceConfig,
    rules: Option<&ValidationRules>,
) -> EnforceConfig {
    let Some(rules) = rules else {
        return base;
    };
    if let Some(v) = rules.max_complexity {
        base.max_complexity = v;
    }
    if let Some(v) = rules.max_method_lines {
        base.max_method_lines = v;
    }
    if let Some(v) = rules.max_class_lines {
        base.max_class_lines = v;
    }
    if !rules.forbidden_imports.is_empty() {
        base.forbidden_imports = rules.forbidden_imports.clone();
    }
    if let Some(v) = rules.enforce_type_hints {
        base.enforce_type_hints = v;
    }
    if let Some(v) = rules.enforce_docstrings {
        base.enforce_docstrings = v;
    }
    if let Some(v) = rules.enforce_interface {
        base.enforce_interface = v;
    }
    if let Some(v) = rules.allow_print_statements {
        base.allow_print_statements = v;
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_only_given_fields() {
        let rules: ValidationRules = serde_json::from_str(
            r#"{"max_complexity": 4, "allow_print_statements": true}"#,
        )
        .unwrap();
        let merged = merge_validation_rules(EnforceConfig::default(), Some(&rules));
        assert_eq!(merged.max_complexity, 4);
        assert!(merged.allow_print_statements);
        // untouched fields keep their defaults
        assert_eq!(merged.max_method_lines, EnforceConfig::default().max_method_lines);
    }

    #[test]
    fn test_feedback_lists_every_violation() {
        let result = ValidationResult::from_violations(
            vec![Violation {
                code: "DANGEROUS_FUNCTION".into(),
                severity: Severity::Error,
                message: "extractor.py: call to dangerous function 'eval'".into(),
                line: 7,
                column: Some(12),
                suggestion: Some("replace eval with explicit parsing".into()),
            }],
            3,
        );
        let feedback = render_feedback(&result);
        assert!(feedback.contains("DANGEROUS_FUNCTION"));
        assert!(feedback.contains("line 7"));
        assert!(feedback.contains("replace eval"));
    }
}
