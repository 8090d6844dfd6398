//! Type descriptors: the explicit, injectable substitute for runtime
//! reflection.
//!
//! A record type opts into schema generation by implementing [`Describe`],
//! either by hand or through the `#[derive(Describe)]` macro. The descriptor
//! exposes the type's identity, declared name, structural shape, and per-field
//! raw annotation strings; nested types are reached through lazy [`Resolver`]
//! edges so self-referential type graphs stay finite values.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::registry::SchemaRegistry;
use crate::schema::Schema;

/// Lazy edge to another type's descriptor.
///
/// A plain function pointer rather than a trait object: descriptors are
/// produced by `fn type_info()` items, and the indirection is what lets a
/// type mention itself without infinite recursion at construction time.
pub type Resolver = fn() -> TypeInfo;

/// Lazy field list of a record type.
pub type FieldsFn = fn() -> Vec<FieldDecl>;

/// Descriptor for a single type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    /// Identity of the described type. Two descriptors describe the same
    /// type exactly when their ids are equal.
    pub id: TypeId,
    /// The type's declared name, or `""` for anonymous/container types
    /// (the caller-supplied hint names those).
    pub name: &'static str,
    /// Structural shape.
    pub shape: Shape,
    /// Optional generation-override capabilities.
    pub overrides: Overrides,
}

impl TypeInfo {
    /// Build a descriptor for `T` with no overrides.
    #[must_use]
    pub fn of<T: 'static>(name: &'static str, shape: Shape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            shape,
            overrides: Overrides::NONE,
        }
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Declared width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    /// 8 bits.
    W8,
    /// 16 bits.
    W16,
    /// 32 bits.
    W32,
    /// 64 bits.
    W64,
    /// Pointer-sized (`isize`/`usize`); resolves to 32 or 64 bits at the
    /// target's pointer width.
    Platform,
}

/// Structural shape of a type.
#[derive(Clone, Copy)]
pub enum Shape {
    /// `bool`.
    Bool,
    /// Signed or unsigned integer of a declared width.
    Integer {
        /// Declared width.
        width: IntWidth,
        /// Unsigned integers additionally get a zero lower bound.
        unsigned: bool,
    },
    /// Floating point.
    Float {
        /// `true` for 64-bit floats (`double` format), `false` for `float`.
        double: bool,
    },
    /// Plain string.
    String,
    /// Date-plus-time instant; renders as an RFC 3339 string.
    DateTime,
    /// Calendar date without a time component.
    Date,
    /// URL/URI.
    Uri,
    /// IP address.
    Ip,
    /// UUID.
    Uuid,
    /// Optional wrapper; the inner type is reached through the resolver.
    Optional(Resolver),
    /// Sequence of elements.
    Array {
        /// Element type.
        items: Resolver,
        /// Compile-time length for fixed-size sequences.
        len: Option<usize>,
    },
    /// String-keyed mapping; only the value type is described.
    Map {
        /// Value type.
        values: Resolver,
    },
    /// Record type with declared, ordered fields.
    Struct {
        /// Lazy field list, in declaration order.
        fields: FieldsFn,
    },
    /// Open "anything goes" type; yields an unconstrained schema.
    Any,
    /// Not representable in a schema; fields of this shape are skipped.
    Unsupported,
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "Bool",
            Self::Integer { .. } => "Integer",
            Self::Float { .. } => "Float",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Uri => "Uri",
            Self::Ip => "Ip",
            Self::Uuid => "Uuid",
            Self::Optional(_) => "Optional",
            Self::Array { .. } => "Array",
            Self::Map { .. } => "Map",
            Self::Struct { .. } => "Struct",
            Self::Any => "Any",
            Self::Unsupported => "Unsupported",
        };
        f.write_str(name)
    }
}

/// A declared field of a record type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// The field's declared name.
    pub name: &'static str,
    /// Position within the declaring record.
    pub index: usize,
    /// The field's element type.
    pub ty: Resolver,
    /// Raw annotation strings, one `(namespace, raw)` pair per annotation
    /// namespace present on the field.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldDecl {
    /// The raw annotation string for `namespace`, if present.
    #[must_use]
    pub fn tag(&self, namespace: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, raw)| *raw)
    }
}

/// The three optional generation-override capabilities a type may carry.
///
/// Resolution order is fixed: `provide` wins over `text`, which wins over
/// default generation; `transform` runs last over whichever path produced
/// the schema.
#[derive(Clone, Copy)]
pub struct Overrides {
    /// The type provides its own schema; default generation is skipped
    /// entirely and the function is fully responsible for the output.
    pub provide: Option<fn(&mut SchemaRegistry) -> Schema>,
    /// The type renders as plain text and gets a plain string schema.
    pub text: bool,
    /// Post-hoc rewrite of the freshly generated schema.
    pub transform: Option<fn(&mut SchemaRegistry, Schema) -> Schema>,
}

impl Overrides {
    /// No overrides.
    pub const NONE: Self = Self {
        provide: None,
        text: false,
        transform: None,
    };
}

/// A type that can describe itself for schema generation.
pub trait Describe: 'static {
    /// The type's descriptor.
    fn type_info() -> TypeInfo;
}

macro_rules! describe_integer {
    ($($ty:ty => ($width:expr, $unsigned:expr)),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::of::<$ty>(
                        stringify!($ty),
                        Shape::Integer { width: $width, unsigned: $unsigned },
                    )
                }
            }
        )*
    };
}

describe_integer! {
    i8 => (IntWidth::W8, false),
    i16 => (IntWidth::W16, false),
    i32 => (IntWidth::W32, false),
    i64 => (IntWidth::W64, false),
    isize => (IntWidth::Platform, false),
    u8 => (IntWidth::W8, true),
    u16 => (IntWidth::W16, true),
    u32 => (IntWidth::W32, true),
    u64 => (IntWidth::W64, true),
    usize => (IntWidth::Platform, true),
}

impl Describe for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<bool>("bool", Shape::Bool)
    }
}

impl Describe for f32 {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<f32>("f32", Shape::Float { double: false })
    }
}

impl Describe for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<f64>("f64", Shape::Float { double: true })
    }
}

impl Describe for String {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<String>("", Shape::String)
    }
}

impl Describe for &'static str {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<&'static str>("", Shape::String)
    }
}

impl Describe for char {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<char>("", Shape::String)
    }
}

impl Describe for () {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<()>("", Shape::Unsupported)
    }
}

impl<T: Describe> Describe for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Option<T>>("", Shape::Optional(T::type_info))
    }
}

impl<T: Describe> Describe for Box<T> {
    // Transparent: a box changes nothing about the described value.
    fn type_info() -> TypeInfo {
        T::type_info()
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Vec<T>>(
            "",
            Shape::Array {
                items: T::type_info,
                len: None,
            },
        )
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<[T; N]>(
            "",
            Shape::Array {
                items: T::type_info,
                len: Some(N),
            },
        )
    }
}

impl<V: Describe> Describe for HashMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<HashMap<String, V>>("", Shape::Map { values: V::type_info })
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<BTreeMap<String, V>>("", Shape::Map { values: V::type_info })
    }
}

impl Describe for serde_json::Value {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<serde_json::Value>("", Shape::Any)
    }
}

impl Describe for chrono::DateTime<chrono::Utc> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::DateTime)
    }
}

impl Describe for chrono::NaiveDateTime {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::DateTime)
    }
}

impl Describe for chrono::NaiveDate {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Date)
    }
}

impl Describe for url::Url {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Uri)
    }
}

impl Describe for std::net::IpAddr {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Ip)
    }
}

impl Describe for std::net::Ipv4Addr {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Ip)
    }
}

impl Describe for std::net::Ipv6Addr {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Ip)
    }
}

impl Describe for uuid::Uuid {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<Self>("", Shape::Uuid)
    }
}
