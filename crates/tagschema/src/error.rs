//! Error types for tag parsing and schema generation.

use thiserror::Error;

/// Error produced while parsing a single tag (annotation) string.
///
/// Tag errors are field-agnostic; [`SchemaError::Tag`] wraps them with the
/// owning type and field name when they surface from the metadata cache.
#[derive(Debug, Error)]
pub enum TagError {
    /// A quoted option value was never closed.
    #[error("unterminated quoted value in {item:?}")]
    UnterminatedQuote {
        /// The offending tag item.
        item: String,
    },
    /// An option had an `=` but no key in front of it.
    #[error("empty option key in {item:?}")]
    EmptyKey {
        /// The offending tag item.
        item: String,
    },
    /// A numeric option value could not be parsed.
    #[error("invalid {option} value {value:?}")]
    InvalidNumber {
        /// The option name, e.g. `min`.
        option: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// `oneof` was given with no values.
    #[error("oneof requires at least one value")]
    EmptyEnum,
    /// The `examples` option did not contain a JSON array.
    #[error("failed to parse examples JSON: {source}")]
    InvalidExamples {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A non-string default value was not valid JSON.
    #[error("invalid JSON default {value:?}: {source}")]
    InvalidDefaultJson {
        /// The raw default value.
        value: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A parsed default value does not match the field's shape.
    #[error("default value {value} does not match field shape: expected {expected}")]
    DefaultMismatch {
        /// The parsed default value.
        value: serde_json::Value,
        /// The JSON shape the field requires.
        expected: &'static str,
    },
    /// A dependent-required list names the same sibling twice.
    #[error("duplicate dependent field {name:?}")]
    DuplicateDependent {
        /// The duplicated sibling name.
        name: String,
    },
    /// A dependent-required list token is not a plain field name.
    #[error("malformed dependent field token {token:?}")]
    MalformedDependent {
        /// The offending token.
        token: String,
    },
    /// A `location=` option named an unknown parameter location.
    #[error("unknown parameter location {value:?}")]
    UnknownLocation {
        /// The raw location value.
        value: String,
    },
}

/// A single dependent-required violation: a field whose dependent list
/// names a sibling that does not exist among the record's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentRequiredViolation {
    /// Output name of the field carrying the dependent-required list.
    pub field: String,
    /// The sibling output name that does not exist.
    pub missing: String,
}

impl std::fmt::Display for DependentRequiredViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dependent field '{}' for field '{}' does not exist",
            self.missing, self.field
        )
    }
}

fn join_violations(violations: &[DependentRequiredViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error produced while generating a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A tag on a field failed to parse, attributed to the owning type.
    #[error("type {type_name}: field {field}: {source}")]
    Tag {
        /// Name of the type declaring the field.
        type_name: String,
        /// Name of the offending field.
        field: String,
        /// The underlying parse error.
        #[source]
        source: TagError,
    },
    /// Struct metadata was requested for a non-record type.
    #[error("type {type_name} is not a record type")]
    NotAStruct {
        /// Name of the offending type.
        type_name: String,
    },
    /// Two distinct types resolved to the same schema name.
    ///
    /// This is a fatal configuration error: rewriting two types to the same
    /// name would silently corrupt the shared schema document, so generation
    /// stops outright instead of attempting any recovery.
    #[error("duplicate schema name {name:?}: type {new} collides with already registered type {existing}")]
    DuplicateName {
        /// The colliding schema name.
        name: String,
        /// Declared name of the already registered type.
        existing: String,
        /// Declared name of the newly offered type.
        new: String,
    },
    /// One or more dependent-required targets do not exist.
    ///
    /// Violations are collected exhaustively across the whole record before
    /// failing, so a fix-and-recheck loop surfaces everything at once.
    #[error("dependent required validation failed: {}", join_violations(.0))]
    DependentRequired(Vec<DependentRequiredViolation>),
}
