//! The `validate` namespace: validation constraints in the familiar
//! comma-separated validator syntax, mapped onto JSON Schema keywords.

use serde_json::Value;

use super::{parse_bool, parse_number, scan, TagItem};
use crate::error::TagError;

/// Validation constraints parsed from a `validate` tag.
///
/// Numeric bounds are kept as `f64` regardless of the field's type; the
/// schema builder decides per shape whether they land on value bounds,
/// string lengths, or item counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateTag {
    /// Inclusive minimum (`min` / `gte`).
    pub minimum: Option<f64>,
    /// Exclusive minimum (`gt`).
    pub exclusive_minimum: Option<f64>,
    /// Inclusive maximum (`max` / `lte`).
    pub maximum: Option<f64>,
    /// Exclusive maximum (`lt`).
    pub exclusive_maximum: Option<f64>,
    /// `multiple_of`.
    pub multiple_of: Option<f64>,
    /// Regex pattern (`pattern`, or derived from `alpha`-family flags).
    pub pattern: Option<String>,
    /// String format (`email`, `url`).
    pub format: Option<String>,
    /// Permitted values (`oneof`).
    pub enum_values: Option<Vec<Value>>,
    /// `required` flag.
    pub required: Option<bool>,
}

/// Parse a `validate` tag, e.g. `required,email,min=5,max=100`.
///
/// Unknown validators are ignored so runtime-only validators can coexist on
/// the same tag. Items apply in source order; a later bound overwrites an
/// earlier one.
pub fn parse_validate_tag(raw: &str) -> Result<ValidateTag, TagError> {
    let mut out = ValidateTag::default();
    for item in scan(raw)? {
        let (key, value) = match &item {
            TagItem::Flag(name) => (name.as_str(), ""),
            TagItem::Pair { key, value } => (key.as_str(), value.as_str()),
        };
        apply_validator(&mut out, key, value)?;
    }
    Ok(out)
}

fn apply_validator(out: &mut ValidateTag, key: &str, value: &str) -> Result<(), TagError> {
    match key {
        "required" => out.required = parse_bool(value),

        "min" | "gte" => out.minimum = Some(parse_number(key, value)?),
        "max" | "lte" => out.maximum = Some(parse_number(key, value)?),
        "gt" => out.exclusive_minimum = Some(parse_number(key, value)?),
        "lt" => out.exclusive_maximum = Some(parse_number(key, value)?),
        "multiple_of" => out.multiple_of = Some(parse_number(key, value)?),

        // Exact length sets both bounds.
        "len" => {
            let n = parse_number(key, value)?;
            out.minimum = Some(n);
            out.maximum = Some(n);
        }

        "email" => out.format = Some("email".to_string()),
        "url" => out.format = Some("uri".to_string()),
        "alpha" => out.pattern = Some("^[a-zA-Z]+$".to_string()),
        "alphanum" => out.pattern = Some("^[a-zA-Z0-9]+$".to_string()),
        "alphaunicode" => out.pattern = Some(r"^[\p{L}]+$".to_string()),
        "alphanumunicode" => out.pattern = Some(r"^[\p{L}\p{N}]+$".to_string()),
        "pattern" => out.pattern = Some(value.to_string()),

        // oneof=red green blue
        "oneof" => {
            let values: Vec<Value> = value
                .split_whitespace()
                .map(|part| Value::String(part.to_string()))
                .collect();
            if values.is_empty() {
                return Err(TagError::EmptyEnum);
            }
            out.enum_values = Some(values);
        }

        // Runtime-only validators carry no schema meaning.
        _ => {}
    }
    Ok(())
}
