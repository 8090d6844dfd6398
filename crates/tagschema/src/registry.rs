//! The schema registry: names, stores, and deduplicates generated schemas,
//! handing out `$ref` references suitable for an OpenAPI
//! `#/components/schemas` section.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::builder::build_schema;
use crate::descriptor::{Describe, Resolver, Shape, TypeInfo};
use crate::error::SchemaError;
use crate::metadata::MetadataCache;
use crate::schema::Schema;

/// Names a schema from its type descriptor and a usage hint.
pub type SchemaNamer = fn(&TypeInfo, &str) -> String;

/// The standard OpenAPI components prefix.
pub const DEFAULT_PREFIX: &str = "#/components/schemas/";

/// Creates and stores schemas and their references.
///
/// Record types are registered under a stable name and referenced by
/// `$ref`; everything else is returned inline. Recursive type graphs work
/// because a name is reserved before its schema is generated, so inner
/// occurrences resolve to a reference to the reserved name.
pub struct SchemaRegistry {
    prefix: String,
    namer: SchemaNamer,
    schemas: BTreeMap<String, Schema>,
    types: HashMap<String, (TypeId, &'static str)>,
    seen: HashSet<TypeId>,
    inline_only: HashSet<String>,
    aliases: HashMap<TypeId, Resolver>,
    metadata: Arc<MetadataCache>,
    default_array_nullable: bool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            namer: default_schema_namer,
            schemas: BTreeMap::new(),
            types: HashMap::new(),
            seen: HashSet::new(),
            inline_only: HashSet::new(),
            aliases: HashMap::new(),
            metadata: Arc::new(MetadataCache::new()),
            default_array_nullable: true,
        }
    }
}

impl SchemaRegistry {
    /// A registry with the standard components prefix, the default namer,
    /// and a fresh metadata cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `prefix` for generated `$ref` paths.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use a custom schema namer. Needed when types with the same declared
    /// name from different modules end up in one registry.
    #[must_use]
    pub fn with_namer(mut self, namer: SchemaNamer) -> Self {
        self.namer = namer;
        self
    }

    /// Share a metadata cache (and its registered tag parsers) with other
    /// registries.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<MetadataCache>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether array schemas read as nullable by default. On by default,
    /// matching decoders that accept `null` where a sequence is expected.
    #[must_use]
    pub fn with_array_nullable(mut self, nullable: bool) -> Self {
        self.default_array_nullable = nullable;
        self
    }

    /// The schema for the type described by `info`.
    ///
    /// Record types register under their name on first sight and come back
    /// as a `$ref` when `allow_ref` is set, or as the full schema
    /// otherwise. `hint` names anonymous types when the descriptor carries
    /// no name. `Ok(None)` means the type has no schema representation.
    pub fn schema(
        &mut self,
        info: TypeInfo,
        allow_ref: bool,
        hint: &str,
    ) -> Result<Option<Schema>, SchemaError> {
        let mut target = info;
        while let Shape::Optional(inner) = target.shape {
            target = inner();
        }

        if let Some(alias) = self.aliases.get(&target.id).copied() {
            log::trace!("substituting alias for type {}", target.name);
            return self.schema(alias(), allow_ref, hint);
        }

        // Only plain record types get names and references; provide and
        // text overrides yield self-contained schemas that read better
        // inline.
        let gets_ref = matches!(target.shape, Shape::Struct { .. })
            && target.overrides.provide.is_none()
            && !target.overrides.text;

        let name = (self.namer)(&target, hint);

        if gets_ref {
            if self.schemas.contains_key(&name) {
                if !self.seen.contains(&target.id) {
                    let (_, existing) = self.types[&name];
                    return Err(SchemaError::DuplicateName {
                        name,
                        existing: existing.to_string(),
                        new: target.name.to_string(),
                    });
                }
                log::trace!("schema {name} already registered");
                if allow_ref {
                    return Ok(Some(Schema::reference(format!("{}{name}", self.prefix))));
                }
                return Ok(Some(self.schemas[&name].clone()));
            }

            // Reserve the name first so recursive types can reference it
            // while their schema is still being generated.
            self.schemas.insert(name.clone(), Schema::default());
            self.types.insert(name.clone(), (target.id, target.name));
            self.seen.insert(target.id);
        }

        // Generation starts from the original descriptor so optional
        // wrappers still read as nullability.
        let built = match build_schema(self, info) {
            Ok(built) => built,
            Err(err) => {
                if gets_ref {
                    self.forget(&name, target.id);
                }
                return Err(err);
            }
        };

        let Some(schema) = built else {
            if gets_ref {
                self.forget(&name, target.id);
            }
            return Ok(None);
        };

        if gets_ref {
            log::debug!("registered schema {name} for type {}", target.name);
            self.schemas.insert(name.clone(), schema.clone());
            if allow_ref {
                return Ok(Some(Schema::reference(format!("{}{name}", self.prefix))));
            }
        }

        Ok(Some(schema))
    }

    /// The schema for `T`, as a reference when `T` is a record type.
    pub fn schema_for<T: Describe>(&mut self) -> Result<Option<Schema>, SchemaError> {
        self.schema(T::type_info(), true, "")
    }

    /// Resolve a `$ref` path produced by this registry back to its schema.
    #[must_use]
    pub fn schema_from_ref(&self, ref_path: &str) -> Option<&Schema> {
        let name = ref_path.strip_prefix(self.prefix.as_str())?;
        self.schemas.get(name)
    }

    /// Resolve a `$ref` path back to the identity of the type it names.
    #[must_use]
    pub fn type_from_ref(&self, ref_path: &str) -> Option<TypeId> {
        let name = ref_path.strip_prefix(self.prefix.as_str())?;
        self.types.get(name).map(|&(id, _)| id)
    }

    /// All registered schemas by name, without the inline-only ones. This
    /// is the `#/components/schemas` payload.
    #[must_use]
    pub fn map(&self) -> BTreeMap<String, Schema> {
        self.schemas
            .iter()
            .filter(|(name, _)| !self.inline_only.contains(*name))
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect()
    }

    /// Generate the schema for `A` wherever `T` appears.
    pub fn register_type_alias<T: 'static, A: Describe>(&mut self) {
        self.aliases.insert(TypeId::of::<T>(), A::type_info);
    }

    /// Exclude a type's schema from [`SchemaRegistry::map`] while keeping
    /// it resolvable through references. Useful when the shared component
    /// would differ from the inline usage.
    pub fn mark_inline_only(&mut self, info: TypeInfo, hint: &str) {
        let mut target = info;
        while let Shape::Optional(inner) = target.shape {
            target = inner();
        }
        let name = (self.namer)(&target, hint);
        log::debug!("marking schema {name} inline-only");
        self.inline_only.insert(name);
    }

    /// The registry's metadata cache.
    #[must_use]
    pub fn metadata(&self) -> Arc<MetadataCache> {
        Arc::clone(&self.metadata)
    }

    /// Whether array schemas read as nullable by default.
    #[must_use]
    pub fn default_array_nullable(&self) -> bool {
        self.default_array_nullable
    }

    fn forget(&mut self, name: &str, id: TypeId) {
        self.schemas.remove(name);
        self.types.remove(name);
        self.seen.remove(&id);
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("prefix", &self.prefix)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// The default schema namer.
///
/// Uses the type's declared name, falling back to the hint for anonymous
/// types. Generic punctuation and separators are flattened away
/// (`Page<User>` becomes `PageUser`), module paths reduce to their last
/// segment, and each remaining part is uppercased on its first character
/// so scalar names read as schema names (`int` becomes `Int`). `[]X`
/// spellings become `ListX`.
#[must_use]
pub fn default_schema_namer(info: &TypeInfo, hint: &str) -> String {
    let mut name = if info.name.is_empty() {
        hint.to_string()
    } else {
        info.name.to_string()
    };

    name = name.replace("[]", "List[");

    let mut result = String::new();
    for part in name.split(|c: char| matches!(c, '[' | ']' | '*' | ',' | '<' | '>' | ' ' | '&')) {
        if part.is_empty() {
            continue;
        }
        let base = part.rsplit("::").next().unwrap_or(part);
        let base = base.rsplit('.').next().unwrap_or(base);
        let mut chars = base.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDecl;
    use rstest::rstest;

    fn named<T: 'static>(name: &'static str, shape: Shape) -> TypeInfo {
        TypeInfo::of::<T>(name, shape)
    }

    #[rstest]
    #[case("User", "", "User")]
    #[case("", "UserItem", "UserItem")]
    #[case("int", "", "Int")]
    #[case("[]int", "", "ListInt")]
    #[case("Page<User>", "", "PageUser")]
    #[case("Map<String, User>", "", "MapStringUser")]
    #[case("my_api::models::User", "", "User")]
    #[case("example.com/foo.Baz", "", "Baz")]
    #[case("&str", "", "Str")]
    fn namer_flattens_and_uppercases(
        #[case] type_name: &'static str,
        #[case] hint: &str,
        #[case] expected: &str,
    ) {
        let info = named::<u64>(type_name, Shape::String);
        assert_eq!(default_schema_namer(&info, hint), expected);
    }

    fn point_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl {
                name: "x",
                index: 0,
                ty: <f64 as Describe>::type_info,
                tags: &[],
            },
            FieldDecl {
                name: "y",
                index: 1,
                ty: <f64 as Describe>::type_info,
                tags: &[],
            },
        ]
    }

    fn point_info() -> TypeInfo {
        named::<fn(i8)>("Point", Shape::Struct { fields: point_fields })
    }

    #[test]
    fn record_types_come_back_as_refs() {
        let mut reg = SchemaRegistry::new();
        let schema = reg.schema(point_info(), true, "").unwrap().unwrap();
        assert_eq!(
            schema.ref_path.as_deref(),
            Some("#/components/schemas/Point")
        );

        let resolved = reg.schema_from_ref("#/components/schemas/Point").unwrap();
        assert_eq!(resolved.properties.len(), 2);
    }

    #[test]
    fn disallowing_refs_returns_the_full_schema() {
        let mut reg = SchemaRegistry::new();
        let schema = reg.schema(point_info(), false, "").unwrap().unwrap();
        assert!(schema.ref_path.is_none());
        assert_eq!(schema.properties.len(), 2);
    }

    #[test]
    fn registration_is_idempotent() {
        let mut reg = SchemaRegistry::new();
        let first = reg.schema(point_info(), true, "").unwrap();
        let second = reg.schema(point_info(), true, "").unwrap();
        assert_eq!(first, second);
        assert_eq!(reg.map().len(), 1);
    }

    #[test]
    fn same_name_from_a_different_type_is_fatal() {
        fn other_point() -> TypeInfo {
            named::<fn(i16)>("Point", Shape::Struct { fields: point_fields })
        }

        let mut reg = SchemaRegistry::new();
        reg.schema(point_info(), true, "").unwrap();
        let err = reg.schema(other_point(), true, "").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName { name, .. } if name == "Point"));
    }

    #[test]
    fn custom_prefix_flows_into_refs() {
        let mut reg = SchemaRegistry::new().with_prefix("#/defs/");
        let schema = reg.schema(point_info(), true, "").unwrap().unwrap();
        assert_eq!(schema.ref_path.as_deref(), Some("#/defs/Point"));
        assert!(reg.schema_from_ref("#/defs/Point").is_some());
    }

    #[test]
    fn aliases_substitute_the_target_type() {
        struct Seconds;

        let mut reg = SchemaRegistry::new();
        reg.register_type_alias::<Seconds, i64>();
        let schema = reg
            .schema(TypeInfo::of::<Seconds>("Seconds", Shape::Unsupported), true, "")
            .unwrap()
            .unwrap();
        assert_eq!(schema.schema_type, Some(crate::schema::SchemaType::Integer));
    }

    #[test]
    fn inline_only_schemas_stay_out_of_the_map() {
        let mut reg = SchemaRegistry::new();
        reg.schema(point_info(), true, "").unwrap();
        reg.mark_inline_only(point_info(), "");
        assert!(reg.map().is_empty());
        // Still resolvable through the ref.
        assert!(reg.schema_from_ref("#/components/schemas/Point").is_some());
    }

    #[test]
    fn type_from_ref_returns_the_identity() {
        let mut reg = SchemaRegistry::new();
        reg.schema(point_info(), true, "").unwrap();
        assert_eq!(
            reg.type_from_ref("#/components/schemas/Point"),
            Some(point_info().id)
        );
    }
}
