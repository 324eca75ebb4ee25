//! The universal JSON-like value sum and typed field paths.
//!
//! Every record that flows through the pipeline — example inputs, example
//! outputs, adapter fetch results — is represented as a [`Value`]. Runtime
//! reflection is deliberately absent: consumers pattern-match on the tag.
//!
//! Field paths use dot notation with `[*]` for array-element descent
//! (`weather[*].description`) and `[N]` for a concrete element.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A JSON-like value with first-class decimal and temporal variants.
///
/// Deserialization only ever produces the JSON subset (`Null`, `Bool`,
/// `Int`, `Float`, `String`, `Array`, `Object`); the temporal and decimal
/// variants are refinements produced by analysis (casts, date parsing).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert from a `serde_json::Value`, preserving object key order.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a `serde_json::Value`. Temporal and decimal variants
    /// render as their canonical string forms.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Look up the value at a dot path. `[N]` segments index into arrays;
    /// `[*]` segments cannot be resolved against a concrete value and
    /// return `None` — callers concretize them first.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for seg in parse_path(path) {
            match seg {
                PathSeg::Key(name) => {
                    current = current.as_object()?.get(&name)?;
                }
                PathSeg::Index(i) => {
                    current = current.as_array()?.get(i)?;
                }
                PathSeg::Star => return None,
            }
        }
        Some(current)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON-like value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        d.deserialize_any(ValueVisitor)
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| E::custom("integer out of range"))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = IndexMap::new();
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            map.insert(k, v);
        }
        Ok(Value::Object(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// =============================================================================
// Field paths
// =============================================================================

/// One segment of a dot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    /// Object key.
    Key(String),
    /// Concrete array index.
    Index(usize),
    /// Array-element wildcard (`[*]`).
    Star,
}

/// Parse a dot path such as `weather[*].description` or `items[0].id`.
pub fn parse_path(path: &str) -> Vec<PathSeg> {
    let mut segs = Vec::new();
    for part in path.split('.') {
        let mut rest = part;
        if let Some(bracket) = rest.find('[') {
            if bracket > 0 {
                segs.push(PathSeg::Key(rest[..bracket].to_string()));
            }
            rest = &rest[bracket..];
            while let Some(close) = rest.find(']') {
                let inner = &rest[1..close];
                if inner == "*" {
                    segs.push(PathSeg::Star);
                } else if let Ok(i) = inner.parse::<usize>() {
                    segs.push(PathSeg::Index(i));
                }
                rest = &rest[close + 1..];
                if !rest.starts_with('[') {
                    break;
                }
            }
        } else if !part.is_empty() {
            segs.push(PathSeg::Key(part.to_string()));
        }
    }
    segs
}

/// Join a path prefix with a child key.
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

// =============================================================================
// Field types
// =============================================================================

/// The structural type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Null,
    Array,
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Null => "null",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        write!(f, "{}", s)
    }
}

impl FieldType {
    /// The tag of a value, without content sniffing.
    pub fn of(value: &Value) -> FieldType {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Int(_) => FieldType::Integer,
            Value::Float(_) => FieldType::Float,
            Value::Decimal(_) => FieldType::Decimal,
            Value::String(_) => FieldType::String,
            Value::Date(_) => FieldType::Date,
            Value::DateTime(_) => FieldType::DateTime,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
        }
    }

    /// The inferred type of a value: like [`FieldType::of`], but string
    /// content that parses as an ISO date, datetime, or time elects the
    /// temporal type.
    pub fn infer(value: &Value) -> FieldType {
        match value {
            Value::String(s) => {
                if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
                    FieldType::Date
                } else if NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
                    || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
                    || chrono::DateTime::parse_from_rfc3339(s).is_ok()
                {
                    FieldType::DateTime
                } else if NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok() {
                    FieldType::Time
                } else {
                    FieldType::String
                }
            }
            other => FieldType::of(other),
        }
    }

    /// Least upper bound of two observed types.
    ///
    /// Identical types join to themselves, integer widens to float, any
    /// numeric joins with decimal to decimal, and incompatible concrete
    /// types fall back to string. `Null` is the identity (nullability is
    /// tracked separately).
    pub fn lub(a: FieldType, b: FieldType) -> FieldType {
        use FieldType::*;
        match (a, b) {
            (x, y) if x == y => x,
            (Null, x) | (x, Null) => x,
            (Integer, Float) | (Float, Integer) => Float,
            (Integer, Decimal) | (Decimal, Integer) => Decimal,
            (Float, Decimal) | (Decimal, Float) => Decimal,
            (Date, DateTime) | (DateTime, Date) => DateTime,
            _ => String,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime | FieldType::Time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_path_plain() {
        assert_eq!(
            parse_path("a.b.c"),
            vec![
                PathSeg::Key("a".into()),
                PathSeg::Key("b".into()),
                PathSeg::Key("c".into())
            ]
        );
    }

    #[test]
    fn test_parse_path_array() {
        assert_eq!(
            parse_path("weather[*].description"),
            vec![
                PathSeg::Key("weather".into()),
                PathSeg::Star,
                PathSeg::Key("description".into())
            ]
        );
        assert_eq!(
            parse_path("items[0]"),
            vec![PathSeg::Key("items".into()), PathSeg::Index(0)]
        );
    }

    #[test]
    fn test_value_at_nested() {
        let v = obj(&[(
            "main",
            obj(&[("temp", Value::Float(15.5))]),
        )]);
        assert_eq!(v.value_at("main.temp"), Some(&Value::Float(15.5)));
        assert_eq!(v.value_at("main.missing"), None);
    }

    #[test]
    fn test_value_at_array_index() {
        let v = obj(&[(
            "weather",
            Value::Array(vec![obj(&[("d", Value::String("rain".into()))])]),
        )]);
        assert_eq!(
            v.value_at("weather[0].d"),
            Some(&Value::String("rain".into()))
        );
        // wildcard cannot resolve against a concrete value
        assert_eq!(v.value_at("weather[*].d"), None);
    }

    #[test]
    fn test_from_json_preserves_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let v = Value::from_json(json);
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_field_type_infer_dates() {
        assert_eq!(
            FieldType::infer(&Value::String("2024-03-01".into())),
            FieldType::Date
        );
        assert_eq!(
            FieldType::infer(&Value::String("2024-03-01T10:00:00".into())),
            FieldType::DateTime
        );
        assert_eq!(
            FieldType::infer(&Value::String("10:00:00".into())),
            FieldType::Time
        );
        assert_eq!(
            FieldType::infer(&Value::String("hello".into())),
            FieldType::String
        );
    }

    #[test]
    fn test_lub_widening() {
        assert_eq!(
            FieldType::lub(FieldType::Integer, FieldType::Float),
            FieldType::Float
        );
        assert_eq!(
            FieldType::lub(FieldType::Null, FieldType::Integer),
            FieldType::Integer
        );
        assert_eq!(
            FieldType::lub(FieldType::Boolean, FieldType::Integer),
            FieldType::String
        );
    }

    #[test]
    fn test_value_yaml_roundtrip() {
        let v = obj(&[
            ("name", Value::String("alice".into())),
            ("age", Value::Int(30)),
            ("scores", Value::Array(vec![Value::Float(1.5), Value::Int(2)])),
        ]);
        let yaml = serde_yaml::to_string(&v).unwrap();
        let back: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(v, back);
    }
}
