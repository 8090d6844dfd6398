//! The `schema` namespace: the field's wire name, requiredness, and
//! parameter location.

use super::{parse_bool, scan, TagItem};
use crate::error::TagError;

/// Where a field is carried in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Path segment.
    Path,
    /// Query string.
    Query,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
    /// Request/response body.
    Body,
}

impl ParamLocation {
    /// The location's wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        }
    }
}

/// A parsed `schema` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTag {
    /// Output name override; the declared field name applies when absent.
    pub name: Option<String>,
    /// Whether the field is required.
    pub required: bool,
    /// Parameter location, if declared.
    pub location: Option<ParamLocation>,
}

/// Parse a `schema` tag, e.g. `user_id,required,location=path`.
///
/// The first bare token (other than `required`) is the output name.
pub fn parse_schema_tag(raw: &str) -> Result<SchemaTag, TagError> {
    let mut out = SchemaTag::default();
    for item in scan(raw)? {
        match item {
            TagItem::Flag(flag) if flag == "required" => out.required = true,
            TagItem::Flag(flag) => {
                if out.name.is_none() {
                    out.name = Some(flag);
                }
            }
            TagItem::Pair { key, value } => match key.as_str() {
                "name" => out.name = Some(value),
                "required" => out.required = parse_bool(&value).unwrap_or(false),
                "location" => out.location = Some(parse_location(&value)?),
                _ => {}
            },
        }
    }
    Ok(out)
}

fn parse_location(value: &str) -> Result<ParamLocation, TagError> {
    match value {
        "path" => Ok(ParamLocation::Path),
        "query" => Ok(ParamLocation::Query),
        "header" => Ok(ParamLocation::Header),
        "cookie" => Ok(ParamLocation::Cookie),
        "body" => Ok(ParamLocation::Body),
        other => Err(TagError::UnknownLocation {
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn first_bare_token_is_the_name() {
        let tag = parse_schema_tag("user_id,required").unwrap();
        assert_eq!(tag.name.as_deref(), Some("user_id"));
        assert!(tag.required);
    }

    #[test]
    fn required_alone_leaves_the_name_unset() {
        let tag = parse_schema_tag("required").unwrap();
        assert_eq!(tag.name, None);
        assert!(tag.required);
    }

    #[rstest]
    #[case("location=path", ParamLocation::Path)]
    #[case("location=query", ParamLocation::Query)]
    #[case("location=header", ParamLocation::Header)]
    #[case("location=cookie", ParamLocation::Cookie)]
    #[case("location=body", ParamLocation::Body)]
    fn locations_parse(#[case] raw: &str, #[case] expected: ParamLocation) {
        assert_eq!(parse_schema_tag(raw).unwrap().location, Some(expected));
    }

    #[test]
    fn unknown_location_is_an_error() {
        assert!(matches!(
            parse_schema_tag("location=form"),
            Err(TagError::UnknownLocation { .. })
        ));
    }
}
