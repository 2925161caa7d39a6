//! Text rendering of field specs and parsing of typed-in answers.

use nafld_core::{FieldSpec, PredictorContext};
use serde_json::Value as JsonValue;

/// Widget a form would use for this kind of field
pub fn widget(spec: &FieldSpec) -> &'static str {
    match spec {
        FieldSpec::Categorical { .. } => "dropdown",
        FieldSpec::BoundedNumeric(_) => "slider",
        FieldSpec::FreeNumeric => "number",
    }
}

pub fn describe(spec: &FieldSpec) -> String {
    match spec {
        FieldSpec::Categorical { choices } => format!("one of: {}", choices.join(" | ")),
        FieldSpec::BoundedNumeric(range) => format!(
            "{} to {} (step {})",
            range.minimum, range.maximum, range.step
        ),
        FieldSpec::FreeNumeric => "any number".to_string(),
    }
}

/// Interpret a typed answer for a field. Numeric fields get a JSON number
/// when the text parses; anything else is passed through as a string and
/// left for validation to reject.
pub fn coerce_text(spec: &FieldSpec, raw: &str) -> JsonValue {
    let raw = raw.trim();
    match spec {
        FieldSpec::Categorical { .. } => JsonValue::String(raw.to_string()),
        FieldSpec::BoundedNumeric(_) | FieldSpec::FreeNumeric => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(raw.to_string())),
    }
}

/// Split a `NAME=VALUE` assignment at the last `=`; feature names may not
/// contain `=`, values never need one
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.rsplit_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

/// One line per schema feature, in vector order
pub fn field_lines(context: &PredictorContext) -> Vec<String> {
    let catalog = context.catalog();
    context
        .schema()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let spec = catalog.spec_for(name);
            format!(
                "{:>2}. {} [{}] {}; default {}",
                i + 1,
                catalog.label_for(name),
                widget(spec),
                describe(spec),
                spec.default_value()
            )
        })
        .collect()
}
