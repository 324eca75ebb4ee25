//! Typed project specification schema.
//!
//! All structs use `#[serde(default)]` liberally so partial specs parse;
//! required-field enforcement is the job of `validate_comprehensive`, which
//! reports every problem at once instead of failing on the first.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use datasmith_core::ExamplePair;

use crate::env::interpolate_tree;
use crate::error::ConfigError;

const KNOWN_SOURCE_TYPES: &[&str] = &[
    "api",
    "url",
    "file_tabular",
    "file_document",
    "file_markup",
    "web_rendered",
    "domain_specific",
];

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").unwrap())
}

/// The full declarative description of one generation run.
///
/// Constructed once at load and held by the orchestrator for the run's
/// duration; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub project: ProjectMeta,
    #[serde(default)]
    pub data_sources: Vec<DataSourceDescriptor>,
    #[serde(default)]
    pub examples: Vec<ExamplePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
    #[serde(default)]
    pub output: Vec<OutputSpec>,
    #[serde(default)]
    pub runtime: RuntimeOpts,
}

/// Project identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Lowercase identifier, unique within the workspace.
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl ProjectSpec {
    /// Parse a YAML project specification.
    ///
    /// Deterministic apart from the documented environment read: `${NAME}`
    /// references in leaf strings are resolved against the process
    /// environment, and an undefined reference fails the load.
    pub fn load(text: &str) -> Result<Self, ConfigError> {
        let mut raw: serde_yaml::Value = serde_yaml::from_str(text)?;
        interpolate_tree(&mut raw)?;

        // Reject unknown source variants before typed deserialization so the
        // error names the offending entry instead of a serde untagged mess.
        if let Some(sources) = raw.get("data_sources").and_then(|v| v.as_sequence()) {
            for (i, source) in sources.iter().enumerate() {
                let kind = source
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("<missing>");
                if !KNOWN_SOURCE_TYPES.contains(&kind) {
                    return Err(ConfigError::UnknownSourceType {
                        kind: kind.to_string(),
                        path: format!("data_sources[{}]", i),
                    });
                }
            }
        }

        let spec: ProjectSpec = serde_yaml::from_value(raw)?;

        if !name_pattern().is_match(&spec.project.name) {
            return Err(ConfigError::InvalidName(spec.project.name.clone()));
        }

        Ok(spec)
    }
}

// =============================================================================
// Data sources
// =============================================================================

/// How and where to fetch input records.
///
/// Required fields are modelled as `Option` on purpose: `load` stays
/// permissive and `validate_comprehensive` reports all missing fields in one
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceDescriptor {
    Api {
        endpoint: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<AuthDescriptor>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        parameters: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        headers: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache: Option<CachePolicy>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rate_limit: Option<RateLimitPolicy>,
    },
    Url {
        url: Option<String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        headers: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache: Option<CachePolicy>,
    },
    FileTabular {
        file_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sheet_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header_row: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skip_rows: Option<usize>,
    },
    FileDocument {
        file_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_range: Option<String>,
        #[serde(default)]
        table_strategy: TableStrategy,
    },
    FileMarkup {
        file_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    WebRendered {
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_header: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        render_wait_ms: Option<u64>,
    },
    DomainSpecific {
        name: Option<String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        options: IndexMap<String, serde_yaml::Value>,
    },
}

impl DataSourceDescriptor {
    /// The variant tag, as written in the spec file.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSourceDescriptor::Api { .. } => "api",
            DataSourceDescriptor::Url { .. } => "url",
            DataSourceDescriptor::FileTabular { .. } => "file_tabular",
            DataSourceDescriptor::FileDocument { .. } => "file_document",
            DataSourceDescriptor::FileMarkup { .. } => "file_markup",
            DataSourceDescriptor::WebRendered { .. } => "web_rendered",
            DataSourceDescriptor::DomainSpecific { .. } => "domain_specific",
        }
    }
}

/// Table-extraction strategy for document sources. Uniform across all
/// table-bearing document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStrategy {
    #[default]
    Lines,
    Text,
    Mixed,
}

/// Authentication descriptor for HTTP-like sources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthDescriptor {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Header name carrying the key (exclusive with `key_param`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_header: Option<String>,
    /// Query parameter carrying the key (exclusive with `key_header`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    ApiKey,
    Bearer,
    Basic,
    Oauth2,
}

/// Response-cache policy for remote sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// TTL in seconds; must be non-negative.
    #[serde(default)]
    pub ttl_secs: i64,
}

fn default_true() -> bool {
    true
}

/// Client-side rate limit for remote sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub requests_per_minute: f64,
}

// =============================================================================
// Outputs, validation rules, runtime knobs
// =============================================================================

/// One output artifact the generated extractor should emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Csv,
    Json,
    Excel,
}

/// Constraint-enforcer overrides carried in the project spec. `None` fields
/// fall back to the enforcer's defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_complexity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_method_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_class_lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_type_hints: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_docstrings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_interface: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_print_statements: Option<bool>,
}

/// Runtime knobs for the generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOpts {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Validation-feedback retry budget (R in the orchestrator loop).
    pub max_retries: u32,
    /// Overall per-run wall-clock budget in seconds.
    pub run_budget_secs: u64,
    /// Gateway rate limit, requests per second.
    pub rate_limit_rps: f64,
}

impl Default for RuntimeOpts {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            max_retries: 2,
            run_budget_secs: 300,
            rate_limit_rps: 2.0,
        }
    }
}
