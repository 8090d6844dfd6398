//! The `dependentRequired` namespace: sibling fields that become mandatory
//! when this field is present.

use super::{scan, TagItem};
use crate::error::TagError;

/// A parsed `dependentRequired` tag: the sibling field names, in source
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependentRequiredTag {
    /// Output names of the fields that become required.
    pub dependents: Vec<String>,
}

/// Parse a `dependentRequired` tag, e.g. `billing_address,cardholder_name`.
///
/// Every item must be a plain field name; `key=value` items are malformed.
/// Listing the same sibling twice is an error rather than silently
/// deduplicated, since a duplicate almost always means a typo for the
/// intended second field.
pub fn parse_dependent_tag(raw: &str) -> Result<DependentRequiredTag, TagError> {
    let mut dependents: Vec<String> = Vec::new();
    for item in scan(raw)? {
        match item {
            TagItem::Flag(name) => {
                if dependents.contains(&name) {
                    return Err(TagError::DuplicateDependent { name });
                }
                dependents.push(name);
            }
            TagItem::Pair { key, value } => {
                return Err(TagError::MalformedDependent {
                    token: format!("{key}={value}"),
                });
            }
        }
    }
    Ok(DependentRequiredTag { dependents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_in_order() {
        let tag = parse_dependent_tag("billing_address,cardholder_name").unwrap();
        assert_eq!(tag.dependents, vec!["billing_address", "cardholder_name"]);
    }

    #[test]
    fn empty_tag_is_empty() {
        assert!(parse_dependent_tag("").unwrap().dependents.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        match parse_dependent_tag("a,b,a") {
            Err(TagError::DuplicateDependent { name }) => assert_eq!(name, "a"),
            other => panic!("expected DuplicateDependent, got {other:?}"),
        }
    }

    #[test]
    fn key_value_tokens_are_malformed() {
        assert!(matches!(
            parse_dependent_tag("field=value"),
            Err(TagError::MalformedDependent { .. })
        ));
    }
}
