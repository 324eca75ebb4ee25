//! Environment-variable interpolation for spec leaf strings.
//!
//! Values may reference environment variables as `${NAME}` or `$NAME`.
//! Resolution happens on the raw YAML tree before typed deserialization, so
//! every leaf string position supports references uniformly.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ConfigError;

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

/// Replace `${NAME}` / `$NAME` references in a single string.
///
/// An undefined variable is an error, not an empty substitution — a spec
/// that silently loses its API key is worse than one that fails to load.
pub fn interpolate_env(input: &str) -> Result<String, ConfigError> {
    interpolate_with(input, |name| std::env::var(name).ok())
}

/// Interpolation with a pluggable lookup, used by tests.
pub(crate) fn interpolate_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = env_pattern();
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in pattern.captures_iter(input) {
        let m = caps.get(0).unwrap();
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|g| g.as_str())
            .unwrap_or_default();
        out.push_str(&input[last..m.start()]);
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => return Err(ConfigError::UnresolvedEnvVar(name.to_string())),
        }
        last = m.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

/// Walk a YAML tree and interpolate every string scalar in place.
pub(crate) fn interpolate_tree(value: &mut serde_yaml::Value) -> Result<(), ConfigError> {
    match value {
        serde_yaml::Value::String(s) => {
            if s.contains('$') {
                *s = interpolate_env(s)?;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                interpolate_tree(item)?;
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                interpolate_tree(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_braced_and_bare() {
        let lookup = |name: &str| match name {
            "HOST" => Some("api.example.com".to_string()),
            "KEY" => Some("abc".to_string()),
            _ => None,
        };
        assert_eq!(
            interpolate_with("https://${HOST}/v1?key=$KEY", lookup).unwrap(),
            "https://api.example.com/v1?key=abc"
        );
    }

    #[test]
    fn test_undefined_var_is_an_error() {
        let err = interpolate_with("${NOPE}", |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedEnvVar(name) if name == "NOPE"));
    }

    #[test]
    fn test_plain_strings_untouched() {
        assert_eq!(
            interpolate_with("no references here", |_| None).unwrap(),
            "no references here"
        );
    }
}
