//! Depth-first schema inference.

use indexmap::IndexMap;
use std::collections::HashSet;

use datasmith_core::{join_path, FieldType, Schema, SchemaField, Value};

/// Per-path observation statistics collected during the traversal.
#[derive(Debug, Default)]
struct PathStats {
    /// Distinct non-null types observed at this path.
    types: Vec<FieldType>,
    /// Indices of the examples in which the path appeared.
    seen_in: HashSet<usize>,
    nulls: usize,
    /// Up to three non-null sample values, in observation order.
    samples: Vec<Value>,
}

impl PathStats {
    fn observe(&mut self, value: &Value, example: usize) {
        self.seen_in.insert(example);
        if value.is_null() {
            self.nulls += 1;
            return;
        }
        let ty = FieldType::infer(value);
        if !self.types.contains(&ty) {
            self.types.push(ty);
        }
        if self.samples.len() < 3
            && !matches!(value, Value::Object(_))
            && !self.samples.contains(value)
        {
            self.samples.push(value.clone());
        }
    }

    fn elected_type(&self) -> FieldType {
        match self.types.split_first() {
            None => FieldType::Null,
            Some((first, rest)) => rest.iter().fold(*first, |acc, t| FieldType::lub(acc, *t)),
        }
    }
}

/// Infer a structural schema from a homogeneous list of values.
///
/// One pass per example, depth-first; `[*]` descends into array elements.
/// O(N·F) for N examples with F fields each. The result is independent of
/// example order up to field ordering, which follows first observation.
pub fn infer_schema(values: &[Value]) -> Schema {
    let mut stats: IndexMap<String, PathStats> = IndexMap::new();

    for (i, value) in values.iter().enumerate() {
        collect(value, "", i, &mut stats);
    }

    let total = values.len();
    let mut fields: Vec<SchemaField> = stats
        .iter()
        .map(|(path, st)| SchemaField {
            path: path.clone(),
            field_type: st.elected_type(),
            nullable: st.nulls > 0,
            required: total > 0 && st.seen_in.len() == total,
            sample_values: st.samples.clone(),
            nested_schema: None,
        })
        .collect();

    attach_nested(&mut fields);

    let is_nested = fields.iter().any(|f| f.path.contains('.'));
    let has_arrays = fields.iter().any(|f| f.field_type == FieldType::Array);

    tracing::debug!(
        examples = total,
        fields = fields.len(),
        is_nested,
        has_arrays,
        "inferred schema"
    );

    Schema {
        fields,
        is_nested,
        has_arrays,
    }
}

fn collect(value: &Value, prefix: &str, example: usize, stats: &mut IndexMap<String, PathStats>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join_path(prefix, key);
                stats.entry(path.clone()).or_default().observe(child, example);
                match child {
                    Value::Object(_) => collect(child, &path, example, stats),
                    Value::Array(items) => {
                        let elem_path = format!("{}[*]", path);
                        for item in items {
                            stats
                                .entry(elem_path.clone())
                                .or_default()
                                .observe(item, example);
                            if matches!(item, Value::Object(_)) {
                                collect(item, &elem_path, example, stats);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            // Bare array root: treat each element as a record.
            for item in items {
                collect(item, prefix, example, stats);
            }
        }
        _ => {
            // Scalar root: a single anonymous field.
            stats
                .entry("$".to_string())
                .or_default()
                .observe(value, example);
        }
    }
}

/// Attach direct-child sub-schemas to object- and array-valued fields.
fn attach_nested(fields: &mut [SchemaField]) {
    let snapshot: Vec<SchemaField> = fields.to_vec();
    for field in fields.iter_mut() {
        let parent = match field.field_type {
            FieldType::Object => field.path.clone(),
            FieldType::Array => format!("{}[*]", field.path),
            _ => continue,
        };
        let prefix = format!("{}.", parent);
        let children: Vec<SchemaField> = snapshot
            .iter()
            .filter(|f| {
                f.path.starts_with(&prefix) && !f.path[prefix.len()..].contains(['.', '['])
            })
            .cloned()
            .collect();
        if !children.is_empty() {
            field.nested_schema = Some(Box::new(Schema {
                is_nested: children.iter().any(|f| f.path.contains('.')),
                has_arrays: children.iter().any(|f| f.field_type == FieldType::Array),
                fields: children,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn example_values() -> Vec<Value> {
        vec![
            obj(&[
                ("name", Value::String("alice".into())),
                ("age", Value::Int(30)),
                ("score", Value::Int(7)),
            ]),
            obj(&[
                ("name", Value::String("bob".into())),
                ("age", Value::Null),
                ("score", Value::Float(8.5)),
                ("extra", Value::Bool(true)),
            ]),
        ]
    }

    #[test]
    fn test_required_iff_in_every_example() {
        let schema = infer_schema(&example_values());
        assert!(schema.field("name").unwrap().required);
        assert!(!schema.field("extra").unwrap().required);
    }

    #[test]
    fn test_nullable_iff_null_observed() {
        let schema = infer_schema(&example_values());
        assert!(schema.field("age").unwrap().nullable);
        assert!(!schema.field("name").unwrap().nullable);
    }

    #[test]
    fn test_int_float_widens() {
        let schema = infer_schema(&example_values());
        assert_eq!(schema.field("score").unwrap().field_type, FieldType::Float);
    }

    #[test]
    fn test_array_descent() {
        let values = vec![obj(&[(
            "weather",
            Value::Array(vec![
                obj(&[("description", Value::String("rain".into()))]),
                obj(&[("description", Value::String("wind".into()))]),
            ]),
        )])];
        let schema = infer_schema(&values);
        assert!(schema.has_arrays);
        assert_eq!(
            schema.field("weather").unwrap().field_type,
            FieldType::Array
        );
        let descr = schema.field("weather[*].description").unwrap();
        assert_eq!(descr.field_type, FieldType::String);
        // nested schema attached to the array field
        let nested = schema.field("weather").unwrap().nested_schema.as_ref().unwrap();
        assert_eq!(nested.fields.len(), 1);
    }

    #[test]
    fn test_samples_capped_at_three() {
        let values: Vec<Value> = (0..6)
            .map(|i| obj(&[("n", Value::Int(i))]))
            .collect();
        let schema = infer_schema(&values);
        assert_eq!(schema.field("n").unwrap().sample_values.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let schema = infer_schema(&[]);
        assert!(schema.is_empty());
    }

    #[test]
    fn test_date_string_elects_date() {
        let values = vec![obj(&[("day", Value::String("2024-05-01".into()))])];
        let schema = infer_schema(&values);
        assert_eq!(schema.field("day").unwrap().field_type, FieldType::Date);
    }

    proptest! {
        /// Shuffling the examples never changes the inferred schema
        /// (compared order-insensitively over fields).
        #[test]
        fn prop_inference_commutative(seed in 0usize..1000) {
            let mut values = example_values();
            let len = values.len().max(1);
            values.rotate_left(seed % len);
            let a = infer_schema(&example_values());
            let b = infer_schema(&values);
            let mut fa = a.fields.clone();
            let mut fb = b.fields.clone();
            fa.sort_by(|x, y| x.path.cmp(&y.path));
            fb.sort_by(|x, y| x.path.cmp(&y.path));
            prop_assert_eq!(fa.len(), fb.len());
            for (x, y) in fa.iter().zip(fb.iter()) {
                prop_assert_eq!(&x.path, &y.path);
                prop_assert_eq!(x.field_type, y.field_type);
                prop_assert_eq!(x.required, y.required);
                prop_assert_eq!(x.nullable, y.nullable);
            }
        }
    }
}
