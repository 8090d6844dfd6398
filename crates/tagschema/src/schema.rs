//! The schema value type and its OpenAPI 3.1 serialization.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// JSON Schema type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// The `additionalProperties` keyword: either a blanket policy or the
/// schema every additional value must match.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows arbitrary extra properties, `false` forbids them.
    Allow(bool),
    /// Extra properties must match this schema (open/map-style objects).
    Schema(Box<Schema>),
}

/// A JSON-Schema/OpenAPI 3.1 schema object.
///
/// Exactly one of `$ref`, a primitive type, array, or object is the active
/// shape. A `$ref` schema serializes as `{"$ref": ...}` alone and carries no
/// other keywords. Schemas are mutated freely while being built and must be
/// treated as frozen once stored in a registry; variant views (for example
/// [`Schema::to_binary_format`]) are produced as copies, never in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Reference path, e.g. `#/components/schemas/User`. When set, all
    /// other fields are ignored by the serializer.
    pub ref_path: Option<String>,
    /// Type discriminator. `None` means "anything goes".
    pub schema_type: Option<SchemaType>,
    /// Nullability. Serialized as `"type": [T, "null"]`, never as a
    /// `nullable` keyword.
    pub nullable: Option<bool>,
    /// Format hint (`int64`, `date-time`, `binary`, ...).
    pub format: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Documented default value. Documentation of runtime behavior, not a
    /// validation constraint.
    pub default: Option<Value>,
    /// Example values.
    pub examples: Option<Vec<Value>>,

    /// Inclusive minimum.
    pub minimum: Option<f64>,
    /// Inclusive maximum.
    pub maximum: Option<f64>,
    /// Exclusive minimum (value style, per OpenAPI 3.1).
    pub exclusive_minimum: Option<f64>,
    /// Exclusive maximum (value style, per OpenAPI 3.1).
    pub exclusive_maximum: Option<f64>,
    /// The value must be a multiple of this number.
    pub multiple_of: Option<f64>,

    /// Minimum string length.
    pub min_length: Option<usize>,
    /// Maximum string length.
    pub max_length: Option<usize>,
    /// Regex pattern.
    pub pattern: Option<String>,
    /// Content encoding for string-carried binary data (`base64`).
    pub content_encoding: Option<String>,
    /// Media type of the decoded string content.
    pub content_media_type: Option<String>,

    /// Array item schema.
    pub items: Option<Box<Schema>>,
    /// Minimum number of items.
    pub min_items: Option<usize>,
    /// Maximum number of items.
    pub max_items: Option<usize>,

    /// Named properties.
    pub properties: BTreeMap<String, Schema>,
    /// Property serialization order (declaration order). Never serialized
    /// itself; properties absent from this list follow in name order.
    pub property_order: Vec<String>,
    /// Names of required properties.
    pub required: Vec<String>,
    /// Additional-properties policy or value schema.
    pub additional_properties: Option<AdditionalProperties>,
    /// Minimum number of properties.
    pub min_properties: Option<usize>,
    /// Maximum number of properties.
    pub max_properties: Option<usize>,
    /// `dependentRequired`: presence of the key property makes the listed
    /// sibling properties mandatory.
    pub dependent_required: BTreeMap<String, Vec<String>>,

    /// Enumeration of permitted values.
    pub enum_values: Option<Vec<Value>>,
    /// Single permitted value; semantically stronger than a one-element
    /// enumeration.
    pub const_value: Option<Value>,

    /// Read-only flag.
    pub read_only: Option<bool>,
    /// Write-only flag.
    pub write_only: Option<bool>,
    /// Deprecation flag.
    pub deprecated: Option<bool>,
    /// Vendor extensions (`x-*` keys), serialized at the top level.
    pub extensions: BTreeMap<String, Value>,

    /// Excluded from serialized output; consulted during generation (for
    /// example, hidden fields are never required).
    pub hidden: bool,
}

impl Schema {
    /// Create an empty schema of the given type.
    #[must_use]
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Create a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    /// Create an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    /// Create a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    /// Create a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    /// Create an array schema with the given item schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    /// Create an empty object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::new(SchemaType::Object)
    }

    /// Create a `$ref` schema pointing at `ref_path`.
    #[must_use]
    pub fn reference(ref_path: impl Into<String>) -> Self {
        Self {
            ref_path: Some(ref_path.into()),
            ..Self::default()
        }
    }

    /// Whether this schema is a `$ref`.
    #[must_use]
    pub fn is_ref(&self) -> bool {
        self.ref_path.is_some()
    }

    /// Rewrite a base64 byte-string schema into its raw-binary string
    /// representation: `contentEncoding` is dropped and `format: "binary"`
    /// substituted. Contexts that represent "this is a raw file" apply this
    /// as a copy-and-patch over the built schema; the cached original is
    /// never mutated. Schemas that are not base64 strings come back
    /// unchanged.
    #[must_use]
    pub fn to_binary_format(&self) -> Self {
        let mut out = self.clone();
        if out.schema_type == Some(SchemaType::String)
            && out.content_encoding.as_deref() == Some("base64")
        {
            out.content_encoding = None;
            out.format = Some("binary".to_string());
        }
        out
    }
}

/// Serialize a whole-number bound as a JSON integer (`0`, not `0.0`),
/// matching the convention that integer-type bounds are integers.
fn number_entry<M: SerializeMap>(map: &mut M, key: &'static str, v: f64) -> Result<(), M::Error> {
    if v.fract() == 0.0 && v.is_finite() {
        // Practical schema constraints are well within i64 range.
        #[allow(clippy::cast_possible_truncation)]
        map.serialize_entry(key, &(v as i64))
    } else {
        map.serialize_entry(key, &v)
    }
}

/// Properties emitted in declaration order, with any stragglers not present
/// in the order list following in name order. Hidden properties are
/// consulted during generation but never emitted.
struct OrderedProperties<'a>(&'a Schema);

impl Serialize for OrderedProperties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self.0;
        let mut map = serializer.serialize_map(None)?;
        for name in &s.property_order {
            if let Some(prop) = s.properties.get(name) {
                if !prop.hidden {
                    map.serialize_entry(name, prop)?;
                }
            }
        }
        for (name, prop) in &s.properties {
            if !s.property_order.contains(name) && !prop.hidden {
                map.serialize_entry(name, prop)?;
            }
        }
        map.end()
    }
}

/// The `type` keyword: a single type string or `[T, "null"]` for nullable
/// schemas.
struct TypeField {
    schema_type: SchemaType,
    nullable: bool,
}

impl Serialize for TypeField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.nullable {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&self.schema_type)?;
            seq.serialize_element(&SchemaType::Null)?;
            seq.end()
        } else {
            self.schema_type.serialize(serializer)
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        // A $ref carries no other keywords.
        if let Some(ref_path) = &self.ref_path {
            map.serialize_entry("$ref", ref_path)?;
            return map.end();
        }

        if let Some(schema_type) = self.schema_type {
            map.serialize_entry(
                "type",
                &TypeField {
                    schema_type,
                    nullable: self.nullable == Some(true),
                },
            )?;
        }
        if let Some(v) = &self.format {
            map.serialize_entry("format", v)?;
        }
        if let Some(v) = &self.title {
            map.serialize_entry("title", v)?;
        }
        if let Some(v) = &self.description {
            map.serialize_entry("description", v)?;
        }
        if let Some(v) = &self.default {
            map.serialize_entry("default", v)?;
        }
        if let Some(v) = &self.examples {
            map.serialize_entry("examples", v)?;
        }

        if let Some(v) = self.minimum {
            number_entry(&mut map, "minimum", v)?;
        }
        if let Some(v) = self.maximum {
            number_entry(&mut map, "maximum", v)?;
        }
        if let Some(v) = self.exclusive_minimum {
            number_entry(&mut map, "exclusiveMinimum", v)?;
        }
        if let Some(v) = self.exclusive_maximum {
            number_entry(&mut map, "exclusiveMaximum", v)?;
        }
        if let Some(v) = self.multiple_of {
            number_entry(&mut map, "multipleOf", v)?;
        }

        if let Some(v) = self.min_length {
            map.serialize_entry("minLength", &v)?;
        }
        if let Some(v) = self.max_length {
            map.serialize_entry("maxLength", &v)?;
        }
        if let Some(v) = &self.pattern {
            map.serialize_entry("pattern", v)?;
        }
        if let Some(v) = &self.content_encoding {
            map.serialize_entry("contentEncoding", v)?;
        }
        if let Some(v) = &self.content_media_type {
            map.serialize_entry("contentMediaType", v)?;
        }

        if let Some(v) = &self.items {
            map.serialize_entry("items", v)?;
        }
        if let Some(v) = self.min_items {
            map.serialize_entry("minItems", &v)?;
        }
        if let Some(v) = self.max_items {
            map.serialize_entry("maxItems", &v)?;
        }

        if !self.properties.is_empty() {
            map.serialize_entry("properties", &OrderedProperties(self))?;
        }
        if !self.required.is_empty() {
            map.serialize_entry("required", &self.required)?;
        }
        if let Some(v) = &self.additional_properties {
            map.serialize_entry("additionalProperties", v)?;
        }
        if let Some(v) = self.min_properties {
            map.serialize_entry("minProperties", &v)?;
        }
        if let Some(v) = self.max_properties {
            map.serialize_entry("maxProperties", &v)?;
        }
        if !self.dependent_required.is_empty() {
            map.serialize_entry("dependentRequired", &self.dependent_required)?;
        }

        if let Some(v) = &self.enum_values {
            map.serialize_entry("enum", v)?;
        }
        if let Some(v) = &self.const_value {
            map.serialize_entry("const", v)?;
        }

        if let Some(v) = self.read_only {
            map.serialize_entry("readOnly", &v)?;
        }
        if let Some(v) = self.write_only {
            map.serialize_entry("writeOnly", &v)?;
        }
        if let Some(v) = self.deprecated {
            map.serialize_entry("deprecated", &v)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}
