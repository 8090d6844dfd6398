//! Tag-driven OpenAPI 3.1 schema generation for record types.
//!
//! Types describe themselves through the [`Describe`] trait (usually via
//! `#[derive(Describe)]`) and annotate fields with namespaced tags:
//! `validate` for constraints, `openapi` for documentation metadata,
//! `default` for documented defaults, `schema` for wire names, and
//! `dependentRequired` for conditional requirements. A [`SchemaRegistry`]
//! walks the descriptors, merges the annotations onto the structural
//! baseline, and stores each record schema once under a stable name so the
//! whole graph serializes as an OpenAPI `#/components/schemas` section with
//! `$ref` links between records.
//!
//! ```
//! use tagschema::{Describe, SchemaRegistry};
//!
//! #[derive(Describe)]
//! struct User {
//!     #[describe(validate = "required")]
//!     id: i64,
//!     #[describe(validate = "required,min=3,max=100", default = "Unknown")]
//!     name: String,
//!     #[describe(validate = "min=0,max=150")]
//!     age: Option<i64>,
//! }
//!
//! let mut registry = SchemaRegistry::new();
//! let schema = registry.schema_for::<User>().unwrap().unwrap();
//! assert_eq!(schema.ref_path.as_deref(), Some("#/components/schemas/User"));
//! ```

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod schema;
pub mod tags;

pub use builder::build_schema;
pub use descriptor::{Describe, FieldDecl, FieldsFn, IntWidth, Overrides, Resolver, Shape, TypeInfo};
pub use error::{DependentRequiredViolation, SchemaError, TagError};
pub use metadata::{FieldMetadata, MetadataCache, StructMetadata, TagParser, SENTINEL_FIELD};
pub use registry::{default_schema_namer, SchemaNamer, SchemaRegistry, DEFAULT_PREFIX};
pub use schema::{AdditionalProperties, Schema, SchemaType};

/// Derives [`Describe`] for a record type.
#[cfg(feature = "derive")]
pub use tagschema_macro::Describe;
