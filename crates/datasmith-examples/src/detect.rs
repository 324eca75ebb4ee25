//! The per-target pattern detectors, in priority order.
//!
//! Every detector answers the same question — "does this rule reproduce the
//! observed output for this target path?" — and scores itself as
//! matching-examples ÷ total-examples. Detectors never fail: undetectable
//! targets fall through to the `CUSTOM` fallback upstream.

use datasmith_core::{
    Evidence, ExamplePair, FieldType, Pattern, PatternKind, Schema, SchemaDiff, SchemaDiffKind,
    Value,
};

use crate::matching::{
    boolean_table, canonical, cast, parse_date, parse_datetime, values_match, MatchKind,
    CAST_TARGETS,
};

/// Delimiters probed for concatenation, in order.
const DELIMITERS: &[&str] = &["", " ", ", ", "-", "/"];

/// Everything the detectors need for one project.
pub struct DetectCtx<'a> {
    pub examples: &'a [ExamplePair],
    pub input_schema: &'a Schema,
    pub output_schema: &'a Schema,
    pub diffs: &'a [SchemaDiff],
    /// Concrete input paths (no `[*]`), excluding object containers.
    pub source_paths: Vec<String>,
    /// Input paths containing `[*]`.
    pub star_paths: Vec<String>,
    pub rename_bonus: f64,
}

impl<'a> DetectCtx<'a> {
    pub fn new(
        examples: &'a [ExamplePair],
        input_schema: &'a Schema,
        output_schema: &'a Schema,
        diffs: &'a [SchemaDiff],
        rename_bonus: f64,
    ) -> Self {
        let mut source_paths = Vec::new();
        let mut star_paths = Vec::new();
        for field in &input_schema.fields {
            if field.field_type == FieldType::Object {
                continue;
            }
            if field.path.contains("[*]") {
                star_paths.push(field.path.clone());
            } else {
                source_paths.push(field.path.clone());
            }
        }
        Self {
            examples,
            input_schema,
            output_schema,
            diffs,
            source_paths,
            star_paths,
            rename_bonus,
        }
    }

    fn n(&self) -> usize {
        self.examples.len()
    }

    fn inputs_at(&self, path: &str) -> Vec<Option<&'a Value>> {
        self.examples
            .iter()
            .map(|ex| ex.input.value_at(path))
            .collect()
    }

    pub fn outputs_at(&self, path: &str) -> Vec<Option<&'a Value>> {
        self.examples
            .iter()
            .map(|ex| ex.output.value_at(path))
            .collect()
    }

    fn source_type(&self, path: &str) -> Option<FieldType> {
        self.input_schema.field(path).map(|f| f.field_type)
    }

    fn target_type(&self, path: &str) -> Option<FieldType> {
        self.output_schema.field(path).map(|f| f.field_type)
    }
}

fn evidence(pairs: &[(Value, Value)]) -> Vec<Evidence> {
    pairs
        .iter()
        .take(3)
        .map(|(input, output)| Evidence {
            input: input.clone(),
            output: output.clone(),
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn pattern(
    kind: PatternKind,
    source_path: Option<String>,
    source_paths: Vec<String>,
    target: &str,
    source_type: Option<FieldType>,
    target_type: Option<FieldType>,
    confidence: f64,
    witnesses: &[(Value, Value)],
    note: String,
) -> Pattern {
    Pattern {
        kind,
        source_path,
        source_paths,
        target_path: target.to_string(),
        source_type,
        target_type,
        confidence: confidence.min(1.0),
        evidence: evidence(witnesses),
        transformation_note: note,
    }
}

// =============================================================================
// 1. CONSTANT
// =============================================================================

/// Whether any leaf anywhere in the tree matches `needle`, arrays included.
fn tree_contains(tree: &Value, needle: &Value) -> bool {
    match tree {
        Value::Object(map) => map.values().any(|v| tree_contains(v, needle)),
        Value::Array(items) => items.iter().any(|v| tree_contains(v, needle)),
        leaf => values_match(leaf, needle).is_some(),
    }
}

pub fn detect_constant(ctx: &DetectCtx, target: &str, outs: &[Option<&Value>]) -> Option<Pattern> {
    let first = outs.first().copied().flatten()?;
    if !outs.iter().all(|o| *o == Some(first)) {
        return None;
    }
    // Must not be explainable by any input value in any example.
    if ctx
        .examples
        .iter()
        .any(|ex| tree_contains(&ex.input, first))
    {
        return None;
    }
    Some(pattern(
        PatternKind::Constant,
        None,
        vec![],
        target,
        None,
        ctx.target_type(target),
        1.0,
        &[(Value::Null, first.clone())],
        format!("always emit {}", first),
    ))
}

// =============================================================================
// 2–3. FIELD_MAPPING / FIELD_RENAME
// =============================================================================

struct EqualityScan {
    matches: usize,
    coerced: bool,
    witnesses: Vec<(Value, Value)>,
}

fn scan_equality(ctx: &DetectCtx, source: &str, outs: &[Option<&Value>]) -> EqualityScan {
    let ins = ctx.inputs_at(source);
    let mut scan = EqualityScan {
        matches: 0,
        coerced: false,
        witnesses: Vec::new(),
    };
    for (input, output) in ins.iter().zip(outs.iter()) {
        if let (Some(input), Some(output)) = (input, output) {
            if let Some(kind) = values_match(input, output) {
                scan.matches += 1;
                if kind == MatchKind::Coerced {
                    scan.coerced = true;
                }
                scan.witnesses.push(((*input).clone(), (*output).clone()));
            }
        }
    }
    scan
}

pub fn detect_field_mapping(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    if !ctx.source_paths.iter().any(|s| s == target) {
        return None;
    }
    let scan = scan_equality(ctx, target, outs);
    if scan.matches == 0 {
        return None;
    }
    Some(pattern(
        PatternKind::FieldMapping,
        Some(target.to_string()),
        vec![],
        target,
        ctx.source_type(target),
        ctx.target_type(target),
        scan.matches as f64 / ctx.n() as f64,
        &scan.witnesses,
        format!("copy {} through unchanged", target),
    ))
}

/// Jaccard similarity over canonical strings of the witnessed value sets.
fn witness_jaccard(ins: &[Option<&Value>], outs: &[Option<&Value>]) -> f64 {
    let a: Vec<String> = ins.iter().flatten().map(|v| canonical(v)).collect();
    let b: Vec<String> = outs.iter().flatten().map(|v| canonical(v)).collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.iter().filter(|x| b.contains(x)).count();
    let union = a.len() + b.iter().filter(|x| !a.contains(x)).count();
    inter as f64 / union as f64
}

pub fn detect_field_rename(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let mut best: Option<(String, EqualityScan)> = None;
    for s in &ctx.source_paths {
        if s == target || s.contains('.') {
            continue;
        }
        let scan = scan_equality(ctx, s, outs);
        if scan.matches == 0 {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |(_, b)| scan.matches > b.matches);
        if better {
            best = Some((s.clone(), scan));
        }
    }
    let (source, scan) = best?;

    let mut confidence = scan.matches as f64 / ctx.n() as f64;
    let analyzer_hint = ctx.diffs.iter().any(|d| {
        d.kind == SchemaDiffKind::RenamedFrom && d.path == target && d.detail == source
    });
    let jaccard_hint = witness_jaccard(&ctx.inputs_at(&source), outs) >= 0.5;
    if analyzer_hint || jaccard_hint {
        confidence += ctx.rename_bonus;
    }

    Some(pattern(
        PatternKind::FieldRename,
        Some(source.clone()),
        vec![],
        target,
        ctx.source_type(&source),
        ctx.target_type(target),
        confidence,
        &scan.witnesses,
        format!("rename {} to {}", source, target),
    ))
}

// =============================================================================
// 4. NESTED_ACCESS / FIELD_EXTRACTION
// =============================================================================

pub fn detect_nested_access(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let target_leaf = target.rsplit('.').next().unwrap_or(target);
    let mut best: Option<(String, EqualityScan)> = None;
    for s in &ctx.source_paths {
        if !s.contains('.') {
            continue;
        }
        let scan = scan_equality(ctx, s, outs);
        if scan.matches == 0 {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |(_, b)| scan.matches > b.matches);
        if better {
            best = Some((s.clone(), scan));
        }
    }
    let (source, scan) = best?;
    let source_leaf = source.rsplit('.').next().unwrap_or(&source);
    let kind = if source_leaf == target_leaf {
        PatternKind::FieldExtraction
    } else {
        PatternKind::NestedAccess
    };
    Some(pattern(
        kind,
        Some(source.clone()),
        vec![],
        target,
        ctx.source_type(&source),
        ctx.target_type(target),
        scan.matches as f64 / ctx.n() as f64,
        &scan.witnesses,
        format!("read nested value at {}", source),
    ))
}

// =============================================================================
// 5. ARRAY_FIRST
// =============================================================================

pub fn detect_array_first(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let mut best: Option<(String, EqualityScan)> = None;
    for star in &ctx.star_paths {
        let concrete = star.replace("[*]", "[0]");
        let scan = scan_equality(ctx, &concrete, outs);
        if scan.matches == 0 {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |(_, b)| scan.matches > b.matches);
        if better {
            best = Some((concrete, scan));
        }
    }
    let (source, scan) = best?;
    Some(pattern(
        PatternKind::ArrayFirst,
        Some(source.clone()),
        vec![],
        target,
        None,
        ctx.target_type(target),
        scan.matches as f64 / ctx.n() as f64,
        &scan.witnesses,
        format!("take the first array element via {}", source),
    ))
}

// =============================================================================
// 6. TYPE_CONVERSION
// =============================================================================

pub fn detect_type_conversion(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let mut best: Option<Pattern> = None;
    for s in &ctx.source_paths {
        if let Some(p) = conversion_for_source(ctx, s, target, outs) {
            let better = best
                .as_ref()
                .map_or(true, |b| p.confidence > b.confidence);
            if better {
                best = Some(p);
            }
        }
    }
    best
}

/// Probe the known casts from one source path toward the target. Also used
/// to emit the companion conversion pattern next to a coerced rename.
pub fn conversion_for_source(
    ctx: &DetectCtx,
    source: &str,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let ins = ctx.inputs_at(source);
    let mut best: Option<(FieldType, usize, Vec<(Value, Value)>)> = None;
    for &tau in CAST_TARGETS {
        let mut matches = 0;
        let mut changed = false;
        let mut witnesses = Vec::new();
        for (input, output) in ins.iter().zip(outs.iter()) {
            if let (Some(input), Some(output)) = (input, output) {
                if let Some(converted) = cast(input, tau) {
                    if values_match(&converted, output).is_some() {
                        matches += 1;
                        if *input != *output {
                            changed = true;
                        }
                        witnesses.push(((*input).clone(), (*output).clone()));
                    }
                }
            }
        }
        // A conversion that never changes anything is a plain mapping.
        if matches == 0 || !changed {
            continue;
        }
        if best.as_ref().map_or(true, |(_, m, _)| matches > *m) {
            best = Some((tau, matches, witnesses));
        }
    }
    let (tau, matches, witnesses) = best?;
    let source_type = ctx.source_type(source);
    Some(pattern(
        PatternKind::TypeConversion,
        Some(source.to_string()),
        vec![],
        target,
        source_type,
        Some(tau),
        matches as f64 / ctx.n() as f64,
        &witnesses,
        format!(
            "convert {} from {} to {}",
            source,
            source_type.map(|t| t.to_string()).unwrap_or_default(),
            tau
        ),
    ))
}

// =============================================================================
// 7. BOOLEAN_CONVERSION
// =============================================================================

pub fn detect_boolean_conversion(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    if !outs.iter().flatten().all(|o| matches!(o, Value::Bool(_))) {
        return None;
    }
    let mut best: Option<(String, usize, Vec<(Value, Value)>)> = None;
    for s in &ctx.source_paths {
        let ins = ctx.inputs_at(s);
        let mut matches = 0;
        let mut witnesses = Vec::new();
        for (input, output) in ins.iter().zip(outs.iter()) {
            if let (Some(input), Some(Value::Bool(b))) = (input, output) {
                if boolean_table(input) == Some(*b) {
                    matches += 1;
                    witnesses.push(((*input).clone(), Value::Bool(*b)));
                }
            }
        }
        if matches > 0 && best.as_ref().map_or(true, |(_, m, _)| matches > *m) {
            best = Some((s.clone(), matches, witnesses));
        }
    }
    let (source, matches, witnesses) = best?;
    Some(pattern(
        PatternKind::BooleanConversion,
        Some(source.clone()),
        vec![],
        target,
        ctx.source_type(&source),
        Some(FieldType::Boolean),
        matches as f64 / ctx.n() as f64,
        &witnesses,
        format!("normalize {} through the yes/no truth table", source),
    ))
}

// =============================================================================
// 8. VALUE_MAPPING
// =============================================================================

pub fn detect_value_mapping(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let mut best: Option<Pattern> = None;
    for s in &ctx.source_paths {
        let ins = ctx.inputs_at(s);
        // canonical input -> first observed output
        let mut table: Vec<(String, Value)> = Vec::new();
        let mut consistent_pairs = 0usize;
        let mut distinct_inputs = 0usize;
        let mut repeats = 0usize;
        let mut any_change = false;
        let mut witnesses = Vec::new();
        for (input, output) in ins.iter().zip(outs.iter()) {
            let (Some(input), Some(output)) = (input, output) else {
                continue;
            };
            if input.is_null() {
                continue;
            }
            let key = canonical(input);
            match table.iter().find(|(k, _)| *k == key) {
                None => {
                    distinct_inputs += 1;
                    consistent_pairs += 1;
                    table.push((key, (*output).clone()));
                    if values_match(input, output).is_none() {
                        any_change = true;
                    }
                    witnesses.push(((*input).clone(), (*output).clone()));
                }
                Some((_, mapped)) => {
                    if values_match(mapped, output).is_some() {
                        repeats += 1;
                    } else {
                        // conflicting target for a witnessed input
                        consistent_pairs = consistent_pairs.saturating_sub(1);
                    }
                }
            }
        }
        // A mapping needs at least two entries and one corroborating
        // repeat; anything thinner is a constant or a one-off.
        if distinct_inputs < 2 || repeats == 0 || !any_change {
            continue;
        }
        let confidence = consistent_pairs as f64 / distinct_inputs as f64;
        let candidate = pattern(
            PatternKind::ValueMapping,
            Some(s.clone()),
            vec![],
            target,
            ctx.source_type(s),
            ctx.target_type(target),
            confidence,
            &witnesses,
            format!("map {} through a {}-entry lookup table", s, table.len()),
        );
        if best
            .as_ref()
            .map_or(true, |b| candidate.confidence > b.confidence)
        {
            best = Some(candidate);
        }
    }
    best
}

// =============================================================================
// 9. CONCATENATION
// =============================================================================

fn stringable(v: &Value) -> Option<String> {
    match v {
        Value::String(_) | Value::Int(_) | Value::Float(_) => Some(canonical(v)),
        _ => None,
    }
}

pub fn detect_concatenation(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    if !outs.iter().flatten().all(|o| matches!(o, Value::String(_))) {
        return None;
    }
    let paths = &ctx.source_paths;
    let n = ctx.n();

    let check = |parts: &[&String], delim: &str| -> Option<(usize, Vec<(Value, Value)>)> {
        let mut matches = 0;
        let mut witnesses = Vec::new();
        for (ex, output) in ctx.examples.iter().zip(outs.iter()) {
            let Some(Value::String(expected)) = output else {
                continue;
            };
            let mut rendered: Vec<String> = Vec::with_capacity(parts.len());
            for p in parts {
                rendered.push(stringable(ex.input.value_at(p)?)?);
            }
            if rendered.join(delim) == *expected {
                matches += 1;
                witnesses.push((
                    Value::Array(rendered.into_iter().map(Value::String).collect()),
                    Value::String(expected.clone()),
                ));
            }
        }
        (matches > 0).then_some((matches, witnesses))
    };

    let mut best: Option<(Vec<String>, String, usize, Vec<(Value, Value)>)> = None;
    let mut consider =
        |parts: &[&String], delim: &str, found: (usize, Vec<(Value, Value)>)| {
            let better = best.as_ref().map_or(true, |(_, _, m, _)| found.0 > *m);
            if better {
                best = Some((
                    parts.iter().map(|s| (*s).clone()).collect(),
                    delim.to_string(),
                    found.0,
                    found.1,
                ));
            }
        };

    for i in 0..paths.len() {
        for j in 0..paths.len() {
            if i == j {
                continue;
            }
            for delim in DELIMITERS {
                if let Some(found) = check(&[&paths[i], &paths[j]], delim) {
                    consider(&[&paths[i], &paths[j]], delim, found);
                }
                for k in 0..paths.len() {
                    if k == i || k == j {
                        continue;
                    }
                    if let Some(found) = check(&[&paths[i], &paths[j], &paths[k]], delim) {
                        consider(&[&paths[i], &paths[j], &paths[k]], delim, found);
                    }
                }
            }
        }
    }

    let (parts, delim, matches, witnesses) = best?;
    Some(pattern(
        PatternKind::Concatenation,
        None,
        parts.clone(),
        target,
        Some(FieldType::String),
        Some(FieldType::String),
        matches as f64 / n as f64,
        &witnesses,
        format!("join {} with {:?}", parts.join(" + "), delim),
    ))
}

// =============================================================================
// 10. DATE_PARSING
// =============================================================================

fn as_date_value(v: &Value) -> Option<Value> {
    match v {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::DateTime(dt) => Some(Value::DateTime(*dt)),
        Value::String(s) => parse_date(s)
            .map(Value::Date)
            .or_else(|| parse_datetime(s).map(Value::DateTime)),
        _ => None,
    }
}

pub fn detect_date_parsing(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let target_type = ctx.target_type(target)?;
    if !target_type.is_temporal() {
        return None;
    }
    let mut best: Option<(String, usize, Vec<(Value, Value)>)> = None;
    for s in &ctx.source_paths {
        let ins = ctx.inputs_at(s);
        let mut matches = 0;
        let mut witnesses = Vec::new();
        for (input, output) in ins.iter().zip(outs.iter()) {
            let (Some(input), Some(output)) = (input, output) else {
                continue;
            };
            if let (Some(din), Some(dout)) = (as_date_value(input), as_date_value(output)) {
                if din == dout {
                    matches += 1;
                    witnesses.push(((*input).clone(), (*output).clone()));
                }
            }
        }
        if matches > 0 && best.as_ref().map_or(true, |(_, m, _)| matches > *m) {
            best = Some((s.clone(), matches, witnesses));
        }
    }
    let (source, matches, witnesses) = best?;
    Some(pattern(
        PatternKind::DateParsing,
        Some(source.clone()),
        vec![],
        target,
        ctx.source_type(&source),
        Some(target_type),
        matches as f64 / ctx.n() as f64,
        &witnesses,
        format!("parse {} with the known date formats", source),
    ))
}

// =============================================================================
// 11. MATH_OPERATION
// =============================================================================

const EPS: f64 = 1e-9;

pub fn detect_math_operation(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    // Two equations minimum: a single example can "solve" anything.
    if ctx.n() < 2 {
        return None;
    }
    let ys: Vec<Option<f64>> = outs.iter().map(|o| o.and_then(|v| v.as_f64())).collect();
    if ys.iter().flatten().count() < 2 {
        return None;
    }

    let numeric_sources: Vec<(&String, Vec<Option<f64>>)> = ctx
        .source_paths
        .iter()
        .map(|s| {
            let xs = ctx
                .inputs_at(s)
                .iter()
                .map(|v| v.and_then(|v| v.as_f64()))
                .collect();
            (s, xs)
        })
        .collect();

    let count_matches = |predict: &dyn Fn(usize) -> Option<f64>| -> usize {
        ys.iter()
            .enumerate()
            .filter(|(i, y)| match (predict(*i), **y) {
                (Some(p), Some(y)) => (p - y).abs() < EPS,
                _ => false,
            })
            .count()
    };

    let mk = |sources: Vec<String>, matches: usize, note: String| -> Pattern {
        let witnesses: Vec<(Value, Value)> = ctx
            .examples
            .iter()
            .zip(outs.iter())
            .filter_map(|(ex, o)| {
                let inputs: Vec<Value> = sources
                    .iter()
                    .filter_map(|s| ex.input.value_at(s).cloned())
                    .collect();
                o.map(|o| (Value::Array(inputs), o.clone()))
            })
            .collect();
        pattern(
            PatternKind::MathOperation,
            sources.first().cloned(),
            sources,
            target,
            None,
            ctx.target_type(target),
            matches as f64 / ctx.n() as f64,
            &witnesses,
            note,
        )
    };

    let mut best: Option<Pattern> = None;
    let mut consider = |candidate: Pattern| {
        if best
            .as_ref()
            .map_or(true, |b| candidate.confidence > b.confidence)
        {
            best = Some(candidate);
        }
    };

    // scale by constant, solved from the first usable equation
    for (s, xs) in &numeric_sources {
        let k = xs
            .iter()
            .zip(ys.iter())
            .find_map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) if x.abs() > EPS => Some(y / x),
                _ => None,
            });
        if let Some(k) = k {
            if (k - 1.0).abs() < EPS {
                continue; // identity is a mapping, not arithmetic
            }
            let matches = count_matches(&|i| xs[i].map(|x| k * x));
            if matches >= 2 {
                consider(mk(
                    vec![(*s).clone()],
                    matches,
                    format!("scale {} by {}", s, k),
                ));
            }
        }
    }

    // two-source forms
    for (i, (sa, xa)) in numeric_sources.iter().enumerate() {
        for (sb, xb) in numeric_sources.iter().skip(i + 1) {
            let forms: [(&str, Box<dyn Fn(f64, f64) -> f64>); 3] = [
                ("sum", Box::new(|a, b| a + b)),
                ("difference", Box::new(|a, b| a - b)),
                ("product", Box::new(|a, b| a * b)),
            ];
            for (name, f) in &forms {
                let matches = count_matches(&|k| match (xa[k], xb[k]) {
                    (Some(a), Some(b)) => Some(f(a, b)),
                    _ => None,
                });
                if matches >= 2 {
                    consider(mk(
                        vec![(*sa).clone(), (*sb).clone()],
                        matches,
                        format!("{} of {} and {}", name, sa, sb),
                    ));
                }
            }
        }
    }

    best
}

// =============================================================================
// 12. STRING_FORMATTING
// =============================================================================

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_currency(s: &str) -> String {
    s.trim_start_matches(['$', '€', '£']).trim().to_string()
}

fn strip_percent(s: &str) -> String {
    s.trim_end_matches('%').trim().to_string()
}

pub fn detect_string_formatting(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    let transforms: [(&str, fn(&str) -> String); 6] = [
        ("trim", |s| s.trim().to_string()),
        ("lowercase", |s| s.to_lowercase()),
        ("uppercase", |s| s.to_uppercase()),
        ("title-case", title_case),
        ("strip currency symbol", strip_currency),
        ("strip percent sign", strip_percent),
    ];

    let mut best: Option<Pattern> = None;
    for s in &ctx.source_paths {
        let ins = ctx.inputs_at(s);
        for (name, f) in &transforms {
            let mut matches = 0;
            let mut changed = false;
            let mut witnesses = Vec::new();
            for (input, output) in ins.iter().zip(outs.iter()) {
                let (Some(Value::String(input_s)), Some(output)) = (input, output) else {
                    continue;
                };
                let rendered = f(input_s);
                let ok = match output {
                    Value::String(out_s) => rendered == *out_s,
                    // stripped numerics may land as numbers
                    other => values_match(&Value::String(rendered.clone()), other).is_some(),
                };
                if ok {
                    matches += 1;
                    if rendered != *input_s.as_str() {
                        changed = true;
                    }
                    witnesses.push((Value::String(input_s.clone()), (**output).clone()));
                }
            }
            if matches == 0 || !changed {
                continue;
            }
            let candidate = pattern(
                PatternKind::StringFormatting,
                Some(s.clone()),
                vec![],
                target,
                Some(FieldType::String),
                ctx.target_type(target),
                matches as f64 / ctx.n() as f64,
                &witnesses,
                format!("{} {}", name, s),
            );
            if best
                .as_ref()
                .map_or(true, |b| candidate.confidence > b.confidence)
            {
                best = Some(candidate);
            }
        }
    }
    best
}

// =============================================================================
// 13. DEFAULT_VALUE
// =============================================================================

pub fn detect_default_value(
    ctx: &DetectCtx,
    target: &str,
    outs: &[Option<&Value>],
) -> Option<Pattern> {
    for s in &ctx.source_paths {
        let ins = ctx.inputs_at(s);
        let absent: Vec<usize> = ins
            .iter()
            .enumerate()
            .filter(|(_, v)| v.map_or(true, |v| v.is_null()))
            .map(|(i, _)| i)
            .collect();
        if absent.is_empty() || absent.len() == ins.len() {
            continue;
        }
        // constant across the absent cases
        let default = match outs[absent[0]] {
            Some(v) => v.clone(),
            None => continue,
        };
        if !absent.iter().all(|&i| outs[i] == Some(&default)) {
            continue;
        }
        let mut matches = absent.len();
        let mut witnesses = vec![(Value::Null, default.clone())];
        for (i, input) in ins.iter().enumerate() {
            if absent.contains(&i) {
                continue;
            }
            if let (Some(input), Some(output)) = (input, outs[i]) {
                if values_match(input, output).is_some() {
                    matches += 1;
                    witnesses.push(((*input).clone(), output.clone()));
                }
            }
        }
        let confidence = matches as f64 / ctx.n() as f64;
        if confidence >= 0.5 {
            return Some(pattern(
                PatternKind::DefaultValue,
                Some(s.clone()),
                vec![],
                target,
                ctx.source_type(s),
                ctx.target_type(target),
                confidence,
                &witnesses,
                format!("pass {} through, defaulting to {} when missing", s, default),
            ));
        }
    }
    None
}

// =============================================================================
// 14. CUSTOM fallback
// =============================================================================

pub fn custom_fallback(ctx: &DetectCtx, target: &str, outs: &[Option<&Value>]) -> Pattern {
    // confidence from value entropy: 0.3 + 0.1 * frequency of the most
    // common output value
    let rendered: Vec<String> = outs.iter().flatten().map(|v| canonical(v)).collect();
    let top = rendered
        .iter()
        .map(|key| rendered.iter().filter(|other| *other == key).count())
        .max()
        .unwrap_or(0);
    let freq = if ctx.n() == 0 {
        0.0
    } else {
        top as f64 / ctx.n() as f64
    };
    let witnesses: Vec<(Value, Value)> = ctx
        .examples
        .iter()
        .zip(outs.iter())
        .filter_map(|(ex, o)| o.map(|o| (ex.input.clone(), o.clone())))
        .collect();
    pattern(
        PatternKind::Custom,
        None,
        vec![],
        target,
        None,
        ctx.target_type(target),
        0.3 + 0.1 * freq,
        &witnesses,
        format!("no mechanical rule found for {}; derive in code", target),
    )
}
