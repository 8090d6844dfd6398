//! The `openapi` namespace: documentation metadata that is not a validation
//! constraint (titles, descriptions, examples, visibility flags, vendor
//! extensions).

use std::collections::BTreeMap;

use serde_json::Value;

use super::{parse_bool, scan, TagItem};
use crate::error::TagError;

/// Documentation metadata parsed from an `openapi` tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenApiTag {
    /// `readOnly` flag.
    pub read_only: Option<bool>,
    /// `writeOnly` flag.
    pub write_only: Option<bool>,
    /// `deprecated` flag.
    pub deprecated: Option<bool>,
    /// `hidden` flag; hidden fields are excluded from the schema entirely.
    pub hidden: Option<bool>,
    /// `title=...`.
    pub title: Option<String>,
    /// `description=...`.
    pub description: Option<String>,
    /// `format=...`.
    pub format: Option<String>,
    /// Example values, from `example=` (single) or `examples=` (JSON array).
    pub examples: Option<Vec<Value>>,
    /// Vendor extensions: `x-*` keys with string values.
    pub extensions: BTreeMap<String, Value>,
}

/// Parse an `openapi` tag, e.g.
/// `readOnly,title=User ID,example=42,x-internal=true`.
///
/// `examples=` expects a JSON array and takes precedence over `example=`
/// regardless of their order. Extension keys must start with `x-` and carry
/// a name after the prefix; other unknown keys are ignored.
pub fn parse_openapi_tag(raw: &str) -> Result<OpenApiTag, TagError> {
    let mut out = OpenApiTag::default();
    let mut examples_from_list = false;

    for item in scan(raw)? {
        let (key, value) = match &item {
            TagItem::Flag(name) => (name.as_str(), ""),
            TagItem::Pair { key, value } => (key.as_str(), value.as_str()),
        };

        if key.starts_with("x-") && key.len() > 3 {
            out.extensions
                .insert(key.to_string(), Value::String(value.to_string()));
            continue;
        }

        match key {
            "readOnly" => out.read_only = parse_bool(value),
            "writeOnly" => out.write_only = parse_bool(value),
            "deprecated" => out.deprecated = parse_bool(value),
            "hidden" => out.hidden = parse_bool(value),

            "title" => out.title = Some(value.to_string()),
            "description" => out.description = Some(value.to_string()),
            "format" => out.format = Some(value.to_string()),

            "example" => {
                if !examples_from_list {
                    out.examples = Some(vec![sniff_example(value)]);
                }
            }
            "examples" => {
                let parsed: Vec<Value> = serde_json::from_str(value)
                    .map_err(|source| TagError::InvalidExamples { source })?;
                out.examples = Some(parsed);
                examples_from_list = true;
            }

            _ => {}
        }
    }
    Ok(out)
}

/// A single example value is a number if it parses as one, a string
/// otherwise.
fn sniff_example(value: &str) -> Value {
    if let Ok(n) = value.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(n) {
            return Value::Number(number);
        }
    }
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn flags_default_to_true() {
        let tag = parse_openapi_tag("readOnly,deprecated").unwrap();
        assert_eq!(tag.read_only, Some(true));
        assert_eq!(tag.deprecated, Some(true));
        assert_eq!(tag.write_only, None);
    }

    #[test]
    fn metadata_strings_are_taken_verbatim() {
        let tag = parse_openapi_tag("title=User ID,description=The primary key").unwrap();
        assert_eq!(tag.title.as_deref(), Some("User ID"));
        assert_eq!(tag.description.as_deref(), Some("The primary key"));
    }

    #[rstest]
    #[case("example=25", json!([25.0]))]
    #[case("example=hello", json!(["hello"]))]
    fn single_example_sniffs_numbers(#[case] raw: &str, #[case] expected: Value) {
        let tag = parse_openapi_tag(raw).unwrap();
        assert_eq!(json!(tag.examples.unwrap()), expected);
    }

    #[test]
    fn examples_list_wins_over_single_example() {
        let tag = parse_openapi_tag("examples='[1,2]',example=9").unwrap();
        assert_eq!(json!(tag.examples.unwrap()), json!([1, 2]));

        let tag = parse_openapi_tag("example=9,examples='[1,2]'").unwrap();
        assert_eq!(json!(tag.examples.unwrap()), json!([1, 2]));
    }

    #[test]
    fn examples_must_be_a_json_array() {
        assert!(matches!(
            parse_openapi_tag("examples=notjson"),
            Err(TagError::InvalidExamples { .. })
        ));
    }

    #[test]
    fn extension_keys_require_a_name_after_the_prefix() {
        let tag = parse_openapi_tag("x-internal=yes,x-=nope").unwrap();
        assert_eq!(tag.extensions.get("x-internal"), Some(&json!("yes")));
        assert!(!tag.extensions.contains_key("x-"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tag = parse_openapi_tag("style=form").unwrap();
        assert_eq!(tag, OpenApiTag::default());
    }
}
