//! datasmith CLI entry point.
//!
//! Exit codes: 0 success, 2 configuration error, 3 LLM/adapter error,
//! 4 validation failure after retries, 5 cancelled, 70 internal error.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use datasmith::cli::Args;
use datasmith::{GenerateError, Generator, EXIT_CONFIG, EXIT_INTERNAL};
use datasmith_config::ProjectSpec;
use datasmith_core::CancellationToken;
use datasmith_examples::parse_examples;
use datasmith_llm::{ChatGateway, GatewayConfig};

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("static directive")),
        )
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return exit(EXIT_INTERNAL);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => exit(code),
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}

async fn run(args: Args) -> Result<(), i32> {
    let text = std::fs::read_to_string(&args.project).map_err(|e| {
        eprintln!("cannot read {}: {e}", args.project.display());
        EXIT_CONFIG
    })?;

    let mut spec = ProjectSpec::load(&text).map_err(|e| {
        eprintln!("invalid project spec: {e}");
        EXIT_CONFIG
    })?;
    if let Some(model) = args.model {
        spec.runtime.model = model;
    }
    if let Some(max_retries) = args.max_retries {
        spec.runtime.max_retries = max_retries;
    }

    if args.dry_run {
        return dry_run(&spec);
    }

    let gateway = ChatGateway::new(GatewayConfig {
        base_url: args
            .base_url
            .unwrap_or_else(|| GatewayConfig::default().base_url),
        api_key: args.api_key.unwrap_or_default(),
        rate_limit_rps: spec.runtime.rate_limit_rps,
        request_timeout: Duration::from_secs(60),
        ..GatewayConfig::default()
    })
    .map_err(|e| {
        eprintln!("cannot build LLM gateway: {e}");
        EXIT_INTERNAL
    })?;

    let project_root = args.out_dir.unwrap_or_else(|| {
        args.project
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into())
    });

    let cancel = CancellationToken::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            ctrl_c_flag.cancel();
        }
    });

    let generator = Generator::new(Arc::new(gateway), project_root).with_cancellation(cancel);

    match generator.run(spec).await {
        Ok(outcome) => {
            for path in &outcome.artifact_paths {
                println!("wrote {}", path.display());
            }
            println!("metadata: {}", outcome.metadata_path.display());
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.exit_code())
        }
    }
}

/// Structured diagnostic: the phase that failed, the error class, and for
/// validation failures every violation with line numbers and suggestions.
fn report_failure(err: &GenerateError) {
    eprintln!("generation failed: {err}");
    match err {
        GenerateError::SpecInvalid(report) => {
            for issue in &report.errors {
                eprintln!("  [{}] {}: {}", issue.code, issue.path, issue.message);
            }
        }
        GenerateError::ValidationFailed { result, .. } => {
            for v in &result.violations {
                eprintln!(
                    "  [{}] line {}: {}{}",
                    v.code,
                    v.line,
                    v.message,
                    v.suggestion
                        .as_deref()
                        .map(|s| format!(" ({s})"))
                        .unwrap_or_default()
                );
            }
        }
        _ => {}
    }
}

fn dry_run(spec: &ProjectSpec) -> Result<(), i32> {
    for (i, descriptor) in spec.data_sources.iter().enumerate() {
        match datasmith_sources::create_adapter(descriptor) {
            Ok(adapter) => println!(
                "source[{i}] {}: config {}",
                descriptor.kind(),
                if adapter.validate_config() { "ok" } else { "INCOMPLETE" }
            ),
            Err(e) => println!("source[{i}] {}: {e}", descriptor.kind()),
        }
    }

    let parsed = parse_examples(&spec.examples);
    println!(
        "{} example(s), {} input field(s), {} output field(s)",
        parsed.num_examples,
        parsed.input_schema.fields.len(),
        parsed.output_schema.fields.len()
    );
    println!("{:<20} {:<24} {:<20} {:>10}", "kind", "source", "target", "confidence");
    for p in &parsed.patterns {
        let source = p
            .source_path
            .clone()
            .unwrap_or_else(|| p.source_paths.join(" + "));
        println!(
            "{:<20} {:<24} {:<20} {:>10.2}",
            p.kind.to_string(),
            source,
            p.target_path,
            p.confidence
        );
    }
    for warning in &parsed.warnings {
        println!("warning: {:?}", warning);
    }
    Ok(())
}
