//! The `default` namespace: a documented default value, parsed against the
//! field's shape.

use serde_json::Value;

use crate::descriptor::{Shape, TypeInfo};
use crate::error::TagError;

/// A default value parsed from a `default` tag.
///
/// The value documents runtime behavior; it is copied into the schema
/// verbatim and never validated against the field's other constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTag {
    /// The parsed value. `None` for an empty tag.
    pub value: Option<Value>,
}

/// Parse a `default` tag against the field's shape.
///
/// String-like fields take the raw tag text as a literal, no quoting needed
/// (`default:"Unknown"`). Every other shape parses the text as JSON and
/// checks the result against the shape: booleans must be booleans, numeric
/// fields numbers, sequences arrays, records and mappings objects.
/// Optional wrappers are transparent.
pub fn parse_default_tag(raw: &str, field_type: TypeInfo) -> Result<DefaultTag, TagError> {
    if raw.is_empty() {
        return Ok(DefaultTag::default());
    }

    let mut info = field_type;
    while let Shape::Optional(inner) = info.shape {
        info = inner();
    }

    let value = match info.shape {
        Shape::String
        | Shape::DateTime
        | Shape::Date
        | Shape::Uri
        | Shape::Ip
        | Shape::Uuid
        | Shape::Unsupported => Value::String(raw.to_string()),

        Shape::Bool => parse_checked(raw, "bool", Value::is_boolean)?,
        Shape::Integer { .. } | Shape::Float { .. } => {
            parse_checked(raw, "number", Value::is_number)?
        }
        Shape::Array { .. } => parse_checked(raw, "array", Value::is_array)?,
        Shape::Map { .. } | Shape::Struct { .. } => {
            parse_checked(raw, "object", Value::is_object)?
        }

        // Anything goes: JSON if it parses, a plain string otherwise.
        Shape::Any => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),

        Shape::Optional(_) => unreachable!("optional wrappers dereferenced above"),
    };

    Ok(DefaultTag { value: Some(value) })
}

fn parse_checked(
    raw: &str,
    expected: &'static str,
    check: impl Fn(&Value) -> bool,
) -> Result<Value, TagError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|source| TagError::InvalidDefaultJson {
            value: raw.to_string(),
            source,
        })?;
    if !check(&value) {
        return Err(TagError::DefaultMismatch { value, expected });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Describe;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn string_defaults_need_no_quotes() {
        let tag = parse_default_tag("Unknown", <String as Describe>::type_info()).unwrap();
        assert_eq!(tag.value, Some(json!("Unknown")));
    }

    #[test]
    fn optional_is_transparent() {
        let tag = parse_default_tag("42", <Option<i64> as Describe>::type_info()).unwrap();
        assert_eq!(tag.value, Some(json!(42)));
    }

    #[rstest]
    #[case("true", json!(true))]
    #[case("false", json!(false))]
    fn bool_defaults_parse_as_json(#[case] raw: &str, #[case] expected: Value) {
        let tag = parse_default_tag(raw, <bool as Describe>::type_info()).unwrap();
        assert_eq!(tag.value, Some(expected));
    }

    #[test]
    fn array_defaults_parse_as_json_arrays() {
        let tag = parse_default_tag("[1,2,3]", <Vec<i64> as Describe>::type_info()).unwrap();
        assert_eq!(tag.value, Some(json!([1, 2, 3])));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        match parse_default_tag("\"three\"", <i64 as Describe>::type_info()) {
            Err(TagError::DefaultMismatch { expected, .. }) => assert_eq!(expected, "number"),
            other => panic!("expected DefaultMismatch, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            parse_default_tag("not json", <i64 as Describe>::type_info()),
            Err(TagError::InvalidDefaultJson { .. })
        ));
    }

    #[test]
    fn empty_tag_yields_no_value() {
        let tag = parse_default_tag("", <i64 as Describe>::type_info()).unwrap();
        assert_eq!(tag.value, None);
    }
}
