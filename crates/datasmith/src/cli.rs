//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

/// datasmith - generate data extractors from input/output examples
#[derive(Parser, Debug, Clone)]
#[command(name = "datasmith")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the project specification YAML
    #[arg(short = 'p', long)]
    pub project: PathBuf,

    /// Directory the generated/ folder is created under
    /// (default: the spec file's directory)
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Override the model from the spec's runtime section
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Override the validation-retry budget
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Chat-completions endpoint base URL
    #[arg(long, env = "DATASMITH_BASE_URL")]
    pub base_url: Option<String>,

    /// API key for the LLM endpoint
    #[arg(long, env = "DATASMITH_API_KEY")]
    pub api_key: Option<String>,

    /// Stop after pattern extraction and print the pattern table
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
