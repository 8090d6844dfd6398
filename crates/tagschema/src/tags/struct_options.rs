//! The `openapiStruct` namespace: record-level schema options, declared on
//! the `_` sentinel field.

use super::{parse_bool, scan, TagItem};
use crate::error::TagError;

/// Record-level schema options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructOptionsTag {
    /// `additionalProperties=true/false`.
    pub additional_properties: Option<bool>,
    /// `nullable=true/false`.
    pub nullable: Option<bool>,
}

/// Parse an `openapiStruct` tag, e.g.
/// `additionalProperties=false,nullable=true`. Unknown options are ignored.
pub fn parse_struct_options_tag(raw: &str) -> Result<StructOptionsTag, TagError> {
    let mut out = StructOptionsTag::default();
    for item in scan(raw)? {
        if let TagItem::Pair { key, value } = item {
            match key.as_str() {
                "additionalProperties" => out.additional_properties = parse_bool(&value),
                "nullable" => out.nullable = parse_bool(&value),
                _ => {}
            }
        }
    }
    Ok(out)
}
