//! Raw annotation scanning and the per-namespace tag parsers.
//!
//! Every namespace shares one surface syntax: a comma-separated list of
//! items, where each item is either a bare flag (`required`) or a
//! `key=value` pair. Values may be wrapped in single quotes to protect
//! embedded commas (`examples='[1,2,3]'`). The scanner here tokenizes that
//! surface; the submodules interpret the tokens per namespace.

pub mod default;
pub mod dependent;
pub mod openapi;
pub mod schema_tag;
pub mod struct_options;
pub mod validate;

use crate::error::TagError;

/// One scanned tag item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagItem {
    /// A bare flag, e.g. `required`.
    Flag(String),
    /// A `key=value` pair. Surrounding single quotes on the value are
    /// already stripped.
    Pair {
        /// The option key.
        key: String,
        /// The option value.
        value: String,
    },
}

/// Scan a raw tag string into its items, in source order.
///
/// Empty items (from stray commas or an empty tag) are dropped. A pair with
/// nothing before the `=` is an error, as is an unclosed single quote.
pub fn scan(raw: &str) -> Result<Vec<TagItem>, TagError> {
    let mut items = Vec::new();
    for piece in split_respecting_quotes(raw)? {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match piece.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(TagError::EmptyKey {
                        item: piece.to_string(),
                    });
                }
                items.push(TagItem::Pair {
                    key: key.to_string(),
                    value: unquote(value.trim()),
                });
            }
            None => items.push(TagItem::Flag(piece.to_string())),
        }
    }
    Ok(items)
}

/// Split on commas that are not inside single quotes.
fn split_respecting_quotes(raw: &str) -> Result<Vec<String>, TagError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for ch in raw.chars() {
        match ch {
            '\'' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            ',' if !in_quote => {
                pieces.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if in_quote {
        return Err(TagError::UnterminatedQuote {
            item: current.trim().to_string(),
        });
    }
    pieces.push(current);
    Ok(pieces)
}

/// Strip one layer of surrounding single quotes, if present.
fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(value);
    stripped.to_string()
}

/// Interpret a flag-or-boolean option value.
///
/// An empty value means the option appeared as a bare flag and reads as
/// `true`. Anything other than `true`/`false` is ignored (`None`).
#[must_use]
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a numeric option value, attributing failures to the option name.
pub(crate) fn parse_number(option: &str, value: &str) -> Result<f64, TagError> {
    if value.is_empty() {
        return Err(TagError::InvalidNumber {
            option: option.to_string(),
            value: value.to_string(),
        });
    }
    value.parse::<f64>().map_err(|_| TagError::InvalidNumber {
        option: option.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn scans_flags_and_pairs_in_order() {
        let items = scan("required,min=3,email").unwrap();
        assert_eq!(
            items,
            vec![
                TagItem::Flag("required".to_string()),
                TagItem::Pair {
                    key: "min".to_string(),
                    value: "3".to_string()
                },
                TagItem::Flag("email".to_string()),
            ]
        );
    }

    #[test]
    fn single_quotes_protect_commas() {
        let items = scan("examples='[1,2,3]',deprecated").unwrap();
        assert_eq!(
            items,
            vec![
                TagItem::Pair {
                    key: "examples".to_string(),
                    value: "[1,2,3]".to_string()
                },
                TagItem::Flag("deprecated".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case(",,")]
    #[case("  ,  ")]
    fn empty_items_are_dropped(#[case] raw: &str) {
        assert!(scan(raw).unwrap().is_empty());
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(matches!(
            scan("pattern='^[a-z,"),
            Err(TagError::UnterminatedQuote { .. })
        ));
    }

    #[test]
    fn pair_without_key_is_an_error() {
        assert!(matches!(scan("=value"), Err(TagError::EmptyKey { .. })));
    }

    #[test]
    fn value_may_contain_further_equals_signs() {
        let items = scan("pattern=^a=b$").unwrap();
        assert_eq!(
            items,
            vec![TagItem::Pair {
                key: "pattern".to_string(),
                value: "^a=b$".to_string()
            }]
        );
    }

    #[rstest]
    #[case("", Some(true))]
    #[case("true", Some(true))]
    #[case("false", Some(false))]
    #[case("yes", None)]
    fn bool_values(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(value), expected);
    }
}
