//! Value equivalence, canonical strings, and cast probing.
//!
//! Pattern detection needs a looser notion of equality than `Value::eq`:
//! the examples `{a: "1"} -> {b: 1}` demonstrate a rename *and* a type
//! conversion, so field matching coerces across representations and reports
//! which flavor of match it found.

use chrono::{NaiveDate, NaiveDateTime};

use datasmith_core::{FieldType, Value};

/// How two values matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Identical values.
    Exact,
    /// Equal after canonical coercion (numeric string vs number,
    /// int vs equal float, date string vs date).
    Coerced,
}

/// Compare two values, coercing across representations.
pub fn values_match(a: &Value, b: &Value) -> Option<MatchKind> {
    if a == b {
        return Some(MatchKind::Exact);
    }
    // int / float equivalence
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        if (x - y).abs() < f64::EPSILON {
            return Some(MatchKind::Coerced);
        }
    }
    // numeric string vs number, date string vs date, etc.
    if canonical(a) == canonical(b) && !a.is_null() && !b.is_null() {
        return Some(MatchKind::Coerced);
    }
    None
}

/// A canonical string rendering used for coerced comparison and for keying
/// value maps: strings unquoted, integers without sign noise, floats with
/// trailing zeros trimmed by the float formatter.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The fixed date-pattern set for date parsing detection.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a string as a date using the known pattern set.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Parse a string as a datetime: RFC-3339 first, then the fixed pattern set.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Apply a known cast from a value toward a target type. Returns `None`
/// when the cast does not apply or loses information.
pub fn cast(value: &Value, target: FieldType) -> Option<Value> {
    match (value, target) {
        (Value::String(s), FieldType::Integer) => s.trim().parse::<i64>().ok().map(Value::Int),
        (Value::String(s), FieldType::Float) => s.trim().parse::<f64>().ok().map(Value::Float),
        (Value::Int(i), FieldType::Float) => Some(Value::Float(*i as f64)),
        (Value::Float(f), FieldType::Integer) if f.fract() == 0.0 => Some(Value::Int(*f as i64)),
        (Value::Int(i), FieldType::String) => Some(Value::String(i.to_string())),
        (Value::Float(f), FieldType::String) => Some(Value::String(f.to_string())),
        // only the ISO forms; looser formats are date *parsing*, not a cast
        (Value::String(s), FieldType::Date) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Value::Date)
        }
        (Value::String(s), FieldType::DateTime) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .ok()
            .map(Value::DateTime),
        (Value::Date(d), FieldType::String) => {
            Some(Value::String(d.format("%Y-%m-%d").to_string()))
        }
        _ => None,
    }
}

/// Candidate cast target types, probed in order.
pub const CAST_TARGETS: &[FieldType] = &[
    FieldType::Integer,
    FieldType::Float,
    FieldType::String,
    FieldType::Date,
    FieldType::DateTime,
];

/// Case-insensitive truthy/falsy lookup table.
pub fn boolean_table(value: &Value) -> Option<bool> {
    let key = match value {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Int(1) => return Some(true),
        Value::Int(0) => return Some(false),
        _ => return None,
    };
    match key.as_str() {
        "yes" | "true" | "1" | "y" => Some(true),
        "no" | "false" | "0" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_coerced_match() {
        assert_eq!(
            values_match(&Value::Int(3), &Value::Int(3)),
            Some(MatchKind::Exact)
        );
        assert_eq!(
            values_match(&Value::String("1".into()), &Value::Int(1)),
            Some(MatchKind::Coerced)
        );
        assert_eq!(
            values_match(&Value::Int(2), &Value::Float(2.0)),
            Some(MatchKind::Coerced)
        );
        assert_eq!(values_match(&Value::Int(1), &Value::Int(2)), None);
    }

    #[test]
    fn test_nulls_never_coerce() {
        assert_eq!(values_match(&Value::Null, &Value::String("null".into())), None);
    }

    #[test]
    fn test_cast_string_to_int() {
        assert_eq!(
            cast(&Value::String(" 42".into()), FieldType::Integer),
            Some(Value::Int(42))
        );
        assert_eq!(cast(&Value::String("x".into()), FieldType::Integer), None);
    }

    #[test]
    fn test_cast_float_to_int_exact_only() {
        assert_eq!(cast(&Value::Float(3.0), FieldType::Integer), Some(Value::Int(3)));
        assert_eq!(cast(&Value::Float(3.5), FieldType::Integer), None);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(expected));
        assert_eq!(parse_date("03/01/2024"), Some(expected));
        assert_eq!(parse_date("01-Mar-2024"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_boolean_table() {
        assert_eq!(boolean_table(&Value::String("Yes".into())), Some(true));
        assert_eq!(boolean_table(&Value::String("n".into())), Some(false));
        assert_eq!(boolean_table(&Value::Int(1)), Some(true));
        assert_eq!(boolean_table(&Value::String("maybe".into())), None);
    }
}
