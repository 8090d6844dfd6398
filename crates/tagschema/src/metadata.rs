//! Per-type metadata extraction and caching.
//!
//! A record type's annotations are parsed once, on first request, into a
//! [`StructMetadata`] that is cached by type identity and shared behind an
//! `Arc`. Parsing is driven by a pluggable table of per-namespace
//! [`TagParser`] functions; consumers read parsed records back out with a
//! typed downcast via [`FieldMetadata::tag`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::descriptor::{FieldDecl, Resolver, Shape, TypeInfo};
use crate::error::{SchemaError, TagError};
use crate::tags::default::parse_default_tag;
use crate::tags::dependent::parse_dependent_tag;
use crate::tags::openapi::parse_openapi_tag;
use crate::tags::schema_tag::parse_schema_tag;
use crate::tags::struct_options::{parse_struct_options_tag, StructOptionsTag};
use crate::tags::validate::parse_validate_tag;

/// The field name reserved for record-level options. A field with this name
/// never becomes a property; its `openapiStruct` annotation configures the
/// record's own schema.
pub const SENTINEL_FIELD: &str = "_";

/// Parser for one annotation namespace.
///
/// Receives the declaring field (so shape-aware namespaces can resolve the
/// field's type), the field's index, and the raw tag text. The returned
/// record is stored type-erased and read back with [`FieldMetadata::tag`].
pub type TagParser =
    fn(&FieldDecl, usize, &str) -> Result<Box<dyn Any + Send + Sync>, TagError>;

/// Parsed metadata for one field.
pub struct FieldMetadata {
    /// Position within the declaring record.
    pub index: usize,
    /// The field's declared name.
    pub field_name: &'static str,
    /// The field's type.
    pub ty: Resolver,
    records: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl FieldMetadata {
    /// The parsed record for `namespace`, downcast to its concrete type.
    /// `None` when the namespace is absent or `T` is not what its parser
    /// produced.
    #[must_use]
    pub fn tag<T: 'static>(&self, namespace: &str) -> Option<&T> {
        self.records.get(namespace)?.downcast_ref::<T>()
    }

    /// Whether the field carries an annotation in `namespace`.
    #[must_use]
    pub fn has_tag(&self, namespace: &str) -> bool {
        self.records.contains_key(namespace)
    }
}

impl std::fmt::Debug for FieldMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMetadata")
            .field("index", &self.index)
            .field("field_name", &self.field_name)
            .field("namespaces", &self.records.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Parsed metadata for one record type.
#[derive(Debug)]
pub struct StructMetadata {
    /// The record's declared name.
    pub type_name: &'static str,
    /// Field metadata in declaration order. The sentinel field is not
    /// included.
    pub fields: Vec<FieldMetadata>,
    /// Record-level options from the sentinel field, if declared.
    pub struct_options: Option<StructOptionsTag>,
    by_name: HashMap<&'static str, usize>,
}

impl StructMetadata {
    /// Look up a field by its declared name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }
}

/// Namespaced tag parsers plus the per-type metadata cache.
pub struct MetadataCache {
    parsers: HashMap<&'static str, TagParser>,
    entries: Mutex<HashMap<TypeId, Arc<StructMetadata>>>,
}

impl Default for MetadataCache {
    fn default() -> Self {
        let mut cache = Self {
            parsers: HashMap::new(),
            entries: Mutex::new(HashMap::new()),
        };
        cache.register_parser("schema", parse_schema_record);
        cache.register_parser("validate", parse_validate_record);
        cache.register_parser("openapi", parse_openapi_record);
        cache.register_parser("openapiStruct", parse_struct_options_record);
        cache.register_parser("default", parse_default_record);
        cache.register_parser("dependentRequired", parse_dependent_record);
        cache
    }
}

impl MetadataCache {
    /// A cache with the built-in namespace parsers registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the parser for an annotation namespace.
    /// Already cached metadata is not re-parsed.
    pub fn register_parser(&mut self, namespace: &'static str, parser: TagParser) {
        self.parsers.insert(namespace, parser);
    }

    /// Parsed metadata for the record type described by `info`, from cache
    /// when available.
    ///
    /// The first parse error encountered wins and is attributed to the
    /// owning type and field. Failed parses are not cached, so a later call
    /// reports the same error again.
    pub fn struct_metadata(&self, info: TypeInfo) -> Result<Arc<StructMetadata>, SchemaError> {
        if let Some(cached) = self.lock_entries().get(&info.id) {
            return Ok(Arc::clone(cached));
        }

        let Shape::Struct { fields } = info.shape else {
            return Err(SchemaError::NotAStruct {
                type_name: info.name.to_string(),
            });
        };

        // Parse outside the lock; tag parsers may be slow and never need
        // cache access.
        let metadata = Arc::new(self.parse_struct(info.name, &fields())?);
        log::debug!(
            "parsed metadata for type {} ({} fields)",
            info.name,
            metadata.fields.len()
        );

        let mut entries = self.lock_entries();
        let entry = entries.entry(info.id).or_insert(metadata);
        Ok(Arc::clone(entry))
    }

    fn parse_struct(
        &self,
        type_name: &'static str,
        decls: &[FieldDecl],
    ) -> Result<StructMetadata, SchemaError> {
        let mut fields = Vec::new();
        let mut by_name = HashMap::new();
        let mut struct_options = None;

        for decl in decls {
            let mut records: HashMap<&'static str, Box<dyn Any + Send + Sync>> = HashMap::new();
            for &(namespace, raw) in decl.tags {
                let Some(parser) = self.parsers.get(namespace) else {
                    continue;
                };
                let record = parser(decl, decl.index, raw).map_err(|source| SchemaError::Tag {
                    type_name: type_name.to_string(),
                    field: decl.name.to_string(),
                    source,
                })?;
                records.insert(namespace, record);
            }

            if decl.name == SENTINEL_FIELD {
                struct_options = records
                    .get("openapiStruct")
                    .and_then(|record| record.downcast_ref::<StructOptionsTag>())
                    .copied();
                continue;
            }

            by_name.insert(decl.name, fields.len());
            fields.push(FieldMetadata {
                index: decl.index,
                field_name: decl.name,
                ty: decl.ty,
                records,
            });
        }

        Ok(StructMetadata {
            type_name,
            fields,
            struct_options,
            by_name,
        })
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<TypeId, Arc<StructMetadata>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("namespaces", &self.parsers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn parse_schema_record(
    _decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_schema_tag(raw)?))
}

fn parse_validate_record(
    _decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_validate_tag(raw)?))
}

fn parse_openapi_record(
    _decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_openapi_tag(raw)?))
}

fn parse_struct_options_record(
    _decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_struct_options_tag(raw)?))
}

fn parse_default_record(
    decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_default_tag(raw, (decl.ty)())?))
}

fn parse_dependent_record(
    _decl: &FieldDecl,
    _index: usize,
    raw: &str,
) -> Result<Box<dyn Any + Send + Sync>, TagError> {
    Ok(Box::new(parse_dependent_tag(raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Describe;
    use crate::tags::validate::ValidateTag;

    fn user_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl {
                name: "id",
                index: 0,
                ty: <i64 as Describe>::type_info,
                tags: &[("validate", "required")],
            },
            FieldDecl {
                name: "name",
                index: 1,
                ty: <String as Describe>::type_info,
                tags: &[("validate", "required,min=3"), ("default", "Unknown")],
            },
            FieldDecl {
                name: "_",
                index: 2,
                ty: <() as Describe>::type_info,
                tags: &[("openapiStruct", "additionalProperties=false")],
            },
        ]
    }

    fn user_info() -> TypeInfo {
        TypeInfo::of::<fn()>("User", Shape::Struct { fields: user_fields })
    }

    #[test]
    fn parses_fields_and_struct_options() {
        let cache = MetadataCache::new();
        let meta = cache.struct_metadata(user_info()).unwrap();

        assert_eq!(meta.type_name, "User");
        assert_eq!(meta.fields.len(), 2);
        assert_eq!(
            meta.struct_options.unwrap().additional_properties,
            Some(false)
        );

        let name = meta.field("name").unwrap();
        let validate: &ValidateTag = name.tag("validate").unwrap();
        assert_eq!(validate.required, Some(true));
        assert_eq!(validate.minimum, Some(3.0));
    }

    #[test]
    fn sentinel_field_is_not_a_property() {
        let cache = MetadataCache::new();
        let meta = cache.struct_metadata(user_info()).unwrap();
        assert!(meta.field(SENTINEL_FIELD).is_none());
    }

    #[test]
    fn metadata_is_cached_by_identity() {
        let cache = MetadataCache::new();
        let first = cache.struct_metadata(user_info()).unwrap();
        let second = cache.struct_metadata(user_info()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn non_struct_types_are_rejected() {
        let cache = MetadataCache::new();
        let err = cache
            .struct_metadata(<i64 as Describe>::type_info())
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotAStruct { .. }));
    }

    #[test]
    fn parse_errors_name_type_and_field() {
        let fields: crate::descriptor::FieldsFn = || {
            vec![FieldDecl {
                name: "age",
                index: 0,
                ty: <i64 as Describe>::type_info,
                tags: &[("validate", "min=abc")],
            }]
        };
        let info = TypeInfo::of::<fn(u8)>("Broken", Shape::Struct { fields });

        let cache = MetadataCache::new();
        let err = cache.struct_metadata(info).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Broken"), "got: {message}");
        assert!(message.contains("age"), "got: {message}");
    }

    #[test]
    fn unregistered_namespaces_are_skipped() {
        let fields: crate::descriptor::FieldsFn = || {
            vec![FieldDecl {
                name: "id",
                index: 0,
                ty: <i64 as Describe>::type_info,
                tags: &[("custom", "whatever")],
            }]
        };
        let info = TypeInfo::of::<fn(u16)>("Custom", Shape::Struct { fields });

        let cache = MetadataCache::new();
        let meta = cache.struct_metadata(info).unwrap();
        assert!(!meta.field("id").unwrap().has_tag("custom"));
    }
}
