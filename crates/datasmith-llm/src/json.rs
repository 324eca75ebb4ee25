//! JSON extraction from free-form model output.
//!
//! When a provider has no structured-output mode (or ignores it), the
//! gateway falls back to pulling the longest balanced `{…}` or `[…]` span
//! out of the text, then lets llm_json repair the common damage (single
//! quotes, trailing commas, Python booleans).

/// Extract the longest balanced object or array span.
pub fn extract_balanced(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;

    for (start, &b) in bytes.iter().enumerate() {
        let (open, close) = match b {
            b'{' => (b'{', b'}'),
            b'[' => (b'[', b']'),
            _ => continue,
        };
        // skip starts that cannot beat the current best
        if let Some((s, e)) = best {
            if text.len() - start <= e - s {
                break;
            }
        }
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, &c) in bytes.iter().enumerate().skip(start) {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        let better = best.map_or(true, |(s, e)| i + 1 - start > e - s);
                        if better {
                            best = Some((start, i + 1));
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    best.map(|(s, e)| &text[s..e])
}

/// Parse model output into JSON: straight parse first, then repair.
pub fn parse_or_repair(text: &str) -> Option<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    tracing::debug!("JSON parse failed, attempting repair");
    llm_json::loads(text, &Default::default()).ok()
}

/// Recover a JSON payload from free-form text: direct parse, then the
/// longest balanced span, repaired if needed. Returns the canonical
/// serialization of whatever parsed.
pub fn recover_json(text: &str) -> Option<String> {
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        return Some(text.to_string());
    }
    let span = extract_balanced(text)?;
    parse_or_repair(span).map(|value| value.to_string())
}
