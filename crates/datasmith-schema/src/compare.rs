//! Schema alignment and rename detection.

use std::collections::HashSet;

use datasmith_core::{FieldType, Schema, SchemaDiff, SchemaDiffKind, SchemaField, Value};

/// Minimum Jaccard similarity for an added/removed pair to be re-labelled
/// as a rename.
const RENAME_THRESHOLD: f64 = 0.5;

/// Compare two schemas, aligning fields by path.
///
/// Paths only in `a` report as `Removed`, only in `b` as `Added`; same path
/// with a different type as `TypeChanged`; same container path whose child
/// structure differs as `StructureChanged`. Added/removed pairs of the same
/// leaf type whose sample values overlap (Jaccard ≥ 0.5) are re-labelled as
/// a rename, tie-broken by path edit distance and then insertion order.
pub fn compare_schemas(a: &Schema, b: &Schema) -> Vec<SchemaDiff> {
    let a_paths: HashSet<&str> = a.fields.iter().map(|f| f.path.as_str()).collect();
    let b_paths: HashSet<&str> = b.fields.iter().map(|f| f.path.as_str()).collect();

    let mut removed: Vec<&SchemaField> = a
        .fields
        .iter()
        .filter(|f| !b_paths.contains(f.path.as_str()))
        .collect();
    let added: Vec<&SchemaField> = b
        .fields
        .iter()
        .filter(|f| !a_paths.contains(f.path.as_str()))
        .collect();

    let mut diffs = Vec::new();

    // Shared paths: type and structure changes.
    for field_b in &b.fields {
        if let Some(field_a) = a.field(&field_b.path) {
            if field_a.field_type != field_b.field_type {
                diffs.push(SchemaDiff {
                    path: field_b.path.clone(),
                    kind: SchemaDiffKind::TypeChanged,
                    detail: format!("{} -> {}", field_a.field_type, field_b.field_type),
                });
            } else if structure_differs(field_a, field_b) {
                diffs.push(SchemaDiff {
                    path: field_b.path.clone(),
                    kind: SchemaDiffKind::StructureChanged,
                    detail: "child structure differs".to_string(),
                });
            }
        }
    }

    // Rename detection over the added/removed frontier.
    let mut renamed_added: HashSet<String> = HashSet::new();
    for field_b in &added {
        let mut best: Option<(usize, f64, usize)> = None; // (removed idx, score, edit dist)
        for (i, field_a) in removed.iter().enumerate() {
            if field_a.field_type != field_b.field_type
                || matches!(field_b.field_type, FieldType::Object | FieldType::Array)
            {
                continue;
            }
            let score = sample_jaccard(&field_a.sample_values, &field_b.sample_values);
            if score < RENAME_THRESHOLD {
                continue;
            }
            let dist = strsim::levenshtein(&field_a.path, &field_b.path);
            let better = match best {
                None => true,
                // higher score wins; then smaller path edit distance;
                // stable on insertion order when still tied
                Some((_, best_score, best_dist)) => {
                    score > best_score || (score == best_score && dist < best_dist)
                }
            };
            if better {
                best = Some((i, score, dist));
            }
        }
        if let Some((i, score, _)) = best {
            let field_a = removed.remove(i);
            renamed_added.insert(field_b.path.clone());
            diffs.push(SchemaDiff {
                path: field_b.path.clone(),
                kind: SchemaDiffKind::RenamedFrom,
                detail: field_a.path.clone(),
            });
            tracing::debug!(
                from = %field_a.path,
                to = %field_b.path,
                score,
                "detected field rename"
            );
        }
    }

    for field_a in removed {
        diffs.push(SchemaDiff {
            path: field_a.path.clone(),
            kind: SchemaDiffKind::Removed,
            detail: field_a.field_type.to_string(),
        });
    }
    for field_b in added {
        if !renamed_added.contains(&field_b.path) {
            diffs.push(SchemaDiff {
                path: field_b.path.clone(),
                kind: SchemaDiffKind::Added,
                detail: field_b.field_type.to_string(),
            });
        }
    }

    diffs
}

fn structure_differs(a: &SchemaField, b: &SchemaField) -> bool {
    match (&a.nested_schema, &b.nested_schema) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(na), Some(nb)) => {
            let pa: HashSet<&str> = na.fields.iter().map(|f| f.path.as_str()).collect();
            let pb: HashSet<&str> = nb.fields.iter().map(|f| f.path.as_str()).collect();
            pa != pb
        }
    }
}

/// Jaccard similarity over the multisets of stringified sample values.
pub fn sample_jaccard(a: &[Value], b: &[Value]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let mut counts_a: Vec<(String, usize)> = Vec::new();
    for v in a {
        let key = v.to_string();
        match counts_a.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts_a.push((key, 1)),
        }
    }
    let mut counts_b: Vec<(String, usize)> = Vec::new();
    for v in b {
        let key = v.to_string();
        match counts_b.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts_b.push((key, 1)),
        }
    }

    let mut intersection = 0usize;
    let mut union = 0usize;
    for (key, na) in &counts_a {
        let nb = counts_b
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        intersection += na.min(&nb);
        union += na.max(&nb);
    }
    for (key, nb) in &counts_b {
        if !counts_a.iter().any(|(k, _)| k == key) {
            union += nb;
        }
    }

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer_schema;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_added_and_removed() {
        let a = infer_schema(&[obj(&[("x", Value::Int(1))])]);
        let b = infer_schema(&[obj(&[("y", Value::String("s".into()))])]);
        let diffs = compare_schemas(&a, &b);
        assert!(diffs
            .iter()
            .any(|d| d.kind == SchemaDiffKind::Removed && d.path == "x"));
        assert!(diffs
            .iter()
            .any(|d| d.kind == SchemaDiffKind::Added && d.path == "y"));
    }

    #[test]
    fn test_type_changed() {
        let a = infer_schema(&[obj(&[("x", Value::Int(1))])]);
        let b = infer_schema(&[obj(&[("x", Value::String("1".into()))])]);
        let diffs = compare_schemas(&a, &b);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, SchemaDiffKind::TypeChanged);
    }

    #[test]
    fn test_rename_detected_by_sample_overlap() {
        let a = infer_schema(&[
            obj(&[("city_name", Value::String("Oslo".into()))]),
            obj(&[("city_name", Value::String("Lima".into()))]),
        ]);
        let b = infer_schema(&[
            obj(&[("city", Value::String("Oslo".into()))]),
            obj(&[("city", Value::String("Lima".into()))]),
        ]);
        let diffs = compare_schemas(&a, &b);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, SchemaDiffKind::RenamedFrom);
        assert_eq!(diffs[0].path, "city");
        assert_eq!(diffs[0].detail, "city_name");
    }

    #[test]
    fn test_rename_tie_broken_by_edit_distance() {
        // Two removed candidates share identical samples; the closer path wins.
        let a = infer_schema(&[obj(&[
            ("temp_c", Value::Int(20)),
            ("temperature_celsius", Value::Int(20)),
        ])]);
        let b = infer_schema(&[obj(&[("temp", Value::Int(20))])]);
        let diffs = compare_schemas(&a, &b);
        let rename = diffs
            .iter()
            .find(|d| d.kind == SchemaDiffKind::RenamedFrom)
            .unwrap();
        assert_eq!(rename.detail, "temp_c");
    }

    #[test]
    fn test_no_rename_below_threshold() {
        let a = infer_schema(&[obj(&[("x", Value::String("alpha".into()))])]);
        let b = infer_schema(&[obj(&[("y", Value::String("omega".into()))])]);
        let diffs = compare_schemas(&a, &b);
        assert!(diffs.iter().all(|d| d.kind != SchemaDiffKind::RenamedFrom));
    }

    #[test]
    fn test_sample_jaccard_multiset() {
        let a = vec![Value::Int(1), Value::Int(2)];
        let b = vec![Value::Int(2), Value::Int(3)];
        let score = sample_jaccard(&a, &b);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }
}
