//! Cross-field semantic validation of a loaded project spec.

use serde::{Deserialize, Serialize};

use crate::spec::{AuthType, DataSourceDescriptor, ProjectSpec};

/// One problem found during comprehensive validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Stable machine code, e.g. `MISSING_FIELD`.
    pub code: String,
    /// Spec path the issue anchors to, e.g. `data_sources[0]`.
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(code: &str, path: String, message: String) -> Self {
        Self {
            code: code.to_string(),
            path,
            message,
        }
    }
}

/// Errors and warnings from one validation pass. Errors make the spec
/// unusable; warnings are carried forward to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every cross-field rule at once, reporting all findings.
pub fn validate_comprehensive(spec: &ProjectSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    if spec.data_sources.is_empty() {
        report.errors.push(ConfigIssue::new(
            "NO_SOURCES",
            "data_sources".into(),
            "at least one data source is required".into(),
        ));
    }
    if spec.output.is_empty() {
        report.errors.push(ConfigIssue::new(
            "NO_OUTPUTS",
            "output".into(),
            "at least one output is required".into(),
        ));
    }

    match spec.examples.len() {
        0 => report.errors.push(ConfigIssue::new(
            "NO_EXAMPLES",
            "examples".into(),
            "at least one input/output example is required".into(),
        )),
        1 => report.warnings.push(ConfigIssue::new(
            "FEW_EXAMPLES",
            "examples".into(),
            "only one example supplied; patterns cannot be cross-checked".into(),
        )),
        n if n > 10 => report.warnings.push(ConfigIssue::new(
            "MANY_EXAMPLES",
            "examples".into(),
            format!("{} examples supplied; more than 10 adds prompt cost without signal", n),
        )),
        _ => {}
    }

    for (i, source) in spec.data_sources.iter().enumerate() {
        let path = format!("data_sources[{}]", i);
        validate_source(source, &path, &mut report);
    }

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated project spec"
    );
    report
}

fn require(
    field: &Option<String>,
    which: &str,
    path: &str,
    report: &mut ValidationReport,
) {
    if field.as_deref().map_or(true, |s| s.is_empty()) {
        report.errors.push(ConfigIssue::new(
            "MISSING_FIELD",
            path.to_string(),
            format!("source requires '{}'", which),
        ));
    }
}

fn validate_source(source: &DataSourceDescriptor, path: &str, report: &mut ValidationReport) {
    match source {
        DataSourceDescriptor::Api {
            endpoint,
            auth,
            cache,
            rate_limit,
            ..
        } => {
            require(endpoint, "endpoint", path, report);
            if let Some(auth) = auth {
                match auth.auth_type {
                    AuthType::ApiKey => {
                        if auth.api_key.is_none() {
                            report.errors.push(ConfigIssue::new(
                                "MISSING_FIELD",
                                format!("{}.auth", path),
                                "api_key auth requires 'api_key'".into(),
                            ));
                        }
                        // key-in-header and key-in-query are exclusive
                        match (&auth.key_header, &auth.key_param) {
                            (Some(_), Some(_)) => report.errors.push(ConfigIssue::new(
                                "CONFLICTING_AUTH",
                                format!("{}.auth", path),
                                "'key_header' and 'key_param' are mutually exclusive".into(),
                            )),
                            (None, None) => report.errors.push(ConfigIssue::new(
                                "MISSING_FIELD",
                                format!("{}.auth", path),
                                "api_key auth requires 'key_header' or 'key_param'".into(),
                            )),
                            _ => {}
                        }
                    }
                    AuthType::Bearer => {
                        if auth.token.is_none() {
                            report.errors.push(ConfigIssue::new(
                                "MISSING_FIELD",
                                format!("{}.auth", path),
                                "bearer auth requires 'token'".into(),
                            ));
                        }
                    }
                    AuthType::Basic => {
                        if auth.username.is_none() || auth.password.is_none() {
                            report.errors.push(ConfigIssue::new(
                                "MISSING_FIELD",
                                format!("{}.auth", path),
                                "basic auth requires 'username' and 'password'".into(),
                            ));
                        }
                    }
                    AuthType::Oauth2 => {
                        if auth.token.is_none() {
                            report.errors.push(ConfigIssue::new(
                                "MISSING_FIELD",
                                format!("{}.auth", path),
                                "oauth2 auth requires 'token'".into(),
                            ));
                        }
                    }
                }
            }
            if let Some(cache) = cache {
                if cache.ttl_secs < 0 {
                    report.errors.push(ConfigIssue::new(
                        "INVALID_CACHE_TTL",
                        format!("{}.cache", path),
                        format!("cache TTL must be non-negative, got {}", cache.ttl_secs),
                    ));
                }
            }
            if let Some(rl) = rate_limit {
                if rl.requests_per_minute <= 0.0 {
                    report.errors.push(ConfigIssue::new(
                        "INVALID_RATE_LIMIT",
                        format!("{}.rate_limit", path),
                        "requests_per_minute must be positive".into(),
                    ));
                }
            }
        }
        DataSourceDescriptor::Url { url, cache, .. } => {
            require(url, "url", path, report);
            if let Some(cache) = cache {
                if cache.ttl_secs < 0 {
                    report.errors.push(ConfigIssue::new(
                        "INVALID_CACHE_TTL",
                        format!("{}.cache", path),
                        format!("cache TTL must be non-negative, got {}", cache.ttl_secs),
                    ));
                }
            }
        }
        DataSourceDescriptor::FileTabular { file_path, .. }
        | DataSourceDescriptor::FileDocument { file_path, .. }
        | DataSourceDescriptor::FileMarkup { file_path, .. } => {
            require(file_path, "file_path", path, report);
        }
        DataSourceDescriptor::WebRendered { url, .. } => {
            require(url, "url", path, report);
        }
        DataSourceDescriptor::DomainSpecific { name, .. } => {
            require(name, "name", path, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ProjectSpec;

    fn load(text: &str) -> ProjectSpec {
        ProjectSpec::load(text).unwrap()
    }

    #[test]
    fn test_valid_spec_passes() {
        let spec = load(
            r#"
project: {name: ok}
data_sources:
  - type: api
    endpoint: https://x.test/v1
examples:
  - {input: {a: 1}, output: {b: 1}}
  - {input: {a: 2}, output: {b: 2}}
output:
  - {format: csv, path: out.csv}
"#,
        );
        let report = validate_comprehensive(&spec);
        assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_everything_reports_all() {
        let spec = load("project: {name: empty}\n");
        let report = validate_comprehensive(&spec);
        let codes: Vec<&str> = report.errors.iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"NO_SOURCES"));
        assert!(codes.contains(&"NO_OUTPUTS"));
        assert!(codes.contains(&"NO_EXAMPLES"));
    }

    #[test]
    fn test_single_example_warns() {
        let spec = load(
            r#"
project: {name: one}
data_sources: [{type: url, url: "https://x.test"}]
examples: [{input: {a: 1}, output: {b: 1}}]
output: [{format: json}]
"#,
        );
        let report = validate_comprehensive(&spec);
        assert!(report.is_ok());
        assert_eq!(report.warnings[0].code, "FEW_EXAMPLES");
    }

    #[test]
    fn test_api_requires_endpoint() {
        let spec = load(
            r#"
project: {name: x}
data_sources: [{type: api}]
examples: [{input: {a: 1}, output: {b: 1}}, {input: {a: 2}, output: {b: 2}}]
output: [{format: json}]
"#,
        );
        let report = validate_comprehensive(&spec);
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].code, "MISSING_FIELD");
        assert_eq!(report.errors[0].path, "data_sources[0]");
    }

    #[test]
    fn test_auth_header_and_param_exclusive() {
        let spec = load(
            r#"
project: {name: x}
data_sources:
  - type: api
    endpoint: https://x.test
    auth: {type: api_key, api_key: secret, key_header: X-Key, key_param: key}
examples: [{input: {a: 1}, output: {b: 1}}, {input: {a: 2}, output: {b: 2}}]
output: [{format: json}]
"#,
        );
        let report = validate_comprehensive(&spec);
        assert!(report
            .errors
            .iter()
            .any(|e| e.code == "CONFLICTING_AUTH"));
    }

    #[test]
    fn test_negative_cache_ttl_rejected() {
        let spec = load(
            r#"
project: {name: x}
data_sources:
  - type: api
    endpoint: https://x.test
    cache: {ttl_secs: -5}
examples: [{input: {a: 1}, output: {b: 1}}, {input: {a: 2}, output: {b: 2}}]
output: [{format: json}]
"#,
        );
        let report = validate_comprehensive(&spec);
        assert!(report.errors.iter().any(|e| e.code == "INVALID_CACHE_TTL"));
    }
}
