//! Schema generation: turning a type descriptor into a schema, merging the
//! field annotations onto the structural baseline.

use crate::descriptor::{IntWidth, Shape, TypeInfo};
use crate::error::{DependentRequiredViolation, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::{AdditionalProperties, Schema, SchemaType};
use crate::tags::default::DefaultTag;
use crate::tags::dependent::DependentRequiredTag;
use crate::tags::openapi::OpenApiTag;
use crate::tags::schema_tag::SchemaTag;
use crate::tags::validate::ValidateTag;

/// Build the schema for the type described by `info`.
///
/// Optional wrappers are dereferenced first and remembered as nullability.
/// A `provide` override short-circuits generation entirely; a `text`
/// override yields a plain string schema; a `transform` override runs last
/// over whichever path produced the schema. `Ok(None)` means the type has
/// no schema representation.
pub fn build_schema(
    reg: &mut SchemaRegistry,
    info: TypeInfo,
) -> Result<Option<Schema>, SchemaError> {
    let mut info = info;
    let mut is_optional = false;
    while let Shape::Optional(inner) = info.shape {
        is_optional = true;
        info = inner();
    }

    let built = build_deref(reg, info, is_optional)?;

    let Some(mut schema) = built else {
        return Ok(None);
    };
    if let Some(transform) = info.overrides.transform {
        schema = transform(reg, schema);
    }
    Ok(Some(schema))
}

fn build_deref(
    reg: &mut SchemaRegistry,
    info: TypeInfo,
    is_optional: bool,
) -> Result<Option<Schema>, SchemaError> {
    if let Some(provide) = info.overrides.provide {
        return Ok(Some(provide(reg)));
    }
    if info.overrides.text {
        let mut schema = Schema::string();
        schema.nullable = Some(is_optional);
        return Ok(Some(schema));
    }

    if let Some(schema) = simple_schema(info, is_optional) {
        return Ok(Some(schema));
    }

    match info.shape {
        Shape::Array { items, len } => array_schema(reg, info, items, len, is_optional).map(Some),
        Shape::Map { values } => {
            let mut schema = Schema::object();
            if let Some(value_schema) =
                reg.schema(values(), true, &format!("{}Value", info.name))?
            {
                schema.additional_properties =
                    Some(AdditionalProperties::Schema(Box::new(value_schema)));
            }
            Ok(Some(schema))
        }
        Shape::Struct { .. } => struct_schema(reg, info).map(Some),
        Shape::Any => Ok(Some(Schema::default())),
        _ => Ok(None),
    }
}

/// The structural baseline for scalar shapes, or `None` for composites.
fn simple_schema(info: TypeInfo, is_optional: bool) -> Option<Schema> {
    let mut schema = match info.shape {
        Shape::Bool => Schema::boolean(),
        Shape::Integer { width, unsigned } => {
            let mut s = Schema::integer();
            s.format = Some(integer_format(width).to_string());
            if unsigned {
                s.minimum = Some(0.0);
            }
            s
        }
        Shape::Float { double } => {
            let mut s = Schema::number();
            s.format = Some(if double { "double" } else { "float" }.to_string());
            s
        }
        Shape::String => Schema::string(),
        Shape::DateTime => string_with_format("date-time"),
        Shape::Date => string_with_format("date"),
        Shape::Uri => string_with_format("uri"),
        Shape::Ip => string_with_format("ipv4"),
        Shape::Uuid => string_with_format("uuid"),
        _ => return None,
    };
    schema.nullable = Some(is_optional);
    Some(schema)
}

fn string_with_format(format: &str) -> Schema {
    let mut schema = Schema::string();
    schema.format = Some(format.to_string());
    schema
}

fn integer_format(width: IntWidth) -> &'static str {
    match width {
        IntWidth::W8 | IntWidth::W16 | IntWidth::W32 => "int32",
        IntWidth::W64 => "int64",
        IntWidth::Platform => {
            if cfg!(target_pointer_width = "64") {
                "int64"
            } else {
                "int32"
            }
        }
    }
}

fn array_schema(
    reg: &mut SchemaRegistry,
    info: TypeInfo,
    items: crate::descriptor::Resolver,
    len: Option<usize>,
    is_optional: bool,
) -> Result<Schema, SchemaError> {
    let item_info = items();

    // Byte sequences serialize as base64 strings, not arrays of numbers.
    if let Shape::Integer {
        width: IntWidth::W8,
        unsigned: true,
    } = item_info.shape
    {
        let mut schema = Schema::string();
        schema.content_encoding = Some("base64".to_string());
        schema.content_media_type = Some("application/octet-stream".to_string());
        schema.nullable = Some(is_optional);
        return Ok(schema);
    }

    let mut schema = Schema::new(SchemaType::Array);
    schema.nullable = Some(reg.default_array_nullable());
    schema.items = reg
        .schema(item_info, true, &format!("{}Item", info.name))?
        .map(Box::new);
    if let Some(len) = len {
        schema.min_items = Some(len);
        schema.max_items = Some(len);
    }
    Ok(schema)
}

fn struct_schema(reg: &mut SchemaRegistry, info: TypeInfo) -> Result<Schema, SchemaError> {
    let metadata = reg.metadata().struct_metadata(info)?;
    let mut schema = Schema::object();

    for field in &metadata.fields {
        let schema_tag = field.tag::<SchemaTag>("schema");
        let openapi_tag = field.tag::<OpenApiTag>("openapi");
        let validate_tag = field.tag::<ValidateTag>("validate");

        let name = schema_tag
            .and_then(|tag| tag.name.clone())
            .unwrap_or_else(|| field.field_name.to_string());
        let required = is_required(schema_tag, openapi_tag, validate_tag);

        let hint = format!("{}{}Struct", metadata.type_name, field.field_name);
        let Some(mut fs) = reg.schema((field.ty)(), true, &hint)? else {
            continue;
        };

        if let Some(tag) = openapi_tag {
            apply_openapi(&mut fs, tag);
        }
        if let Some(tag) = validate_tag {
            apply_validate(&mut fs, tag);
        }

        // A required field must be present, so it cannot read as nullable.
        if required && fs.nullable == Some(true) {
            fs.nullable = Some(false);
        }

        if let Some(tag) = field.tag::<DefaultTag>("default") {
            if let Some(value) = &tag.value {
                fs.default = Some(value.clone());
            }
        }

        // dependentRequired lives on the record schema, keyed by this
        // field's output name.
        if let Some(tag) = field.tag::<DependentRequiredTag>("dependentRequired") {
            if !tag.dependents.is_empty() {
                schema
                    .dependent_required
                    .insert(name.clone(), tag.dependents.clone());
            }
        }

        if required {
            schema.required.push(name.clone());
        }
        schema.property_order.push(name.clone());
        schema.properties.insert(name, fs);
    }

    validate_dependent_required(&schema)?;

    if let Some(options) = metadata.struct_options {
        if let Some(allow) = options.additional_properties {
            schema.additional_properties = Some(AdditionalProperties::Allow(allow));
        }
        if options.nullable.is_some() {
            schema.nullable = options.nullable;
        }
    }

    Ok(schema)
}

/// Whether a field lands in `required`. Hidden fields never do; otherwise
/// either the `schema` or the `validate` namespace can require the field.
fn is_required(
    schema_tag: Option<&SchemaTag>,
    openapi_tag: Option<&OpenApiTag>,
    validate_tag: Option<&ValidateTag>,
) -> bool {
    if openapi_tag.is_some_and(|tag| tag.hidden == Some(true)) {
        return false;
    }
    if schema_tag.is_some_and(|tag| tag.required) {
        return true;
    }
    validate_tag.is_some_and(|tag| tag.required == Some(true))
}

fn apply_openapi(fs: &mut Schema, tag: &OpenApiTag) {
    if tag.title.is_some() {
        fs.title = tag.title.clone();
    }
    if tag.description.is_some() {
        fs.description = tag.description.clone();
    }
    if tag.format.is_some() {
        fs.format = tag.format.clone();
    }
    if tag.examples.is_some() {
        fs.examples = tag.examples.clone();
    }

    fs.read_only = tag.read_only;
    fs.write_only = tag.write_only;
    fs.deprecated = tag.deprecated;
    if let Some(hidden) = tag.hidden {
        fs.hidden = hidden;
    }
    fs.extensions.extend(
        tag.extensions
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
}

fn apply_validate(fs: &mut Schema, tag: &ValidateTag) {
    apply_min_max(fs, tag);

    fs.exclusive_minimum = tag.exclusive_minimum;
    fs.exclusive_maximum = tag.exclusive_maximum;
    fs.multiple_of = tag.multiple_of;

    if tag.pattern.is_some() {
        fs.pattern = tag.pattern.clone();
    }
    // A format from the openapi namespace wins.
    if fs.format.is_none() {
        fs.format = tag.format.clone();
    }

    apply_enum(fs, tag);
}

/// `min`/`max` share one spelling but mean different keywords per shape:
/// value bounds on numbers, length bounds on strings, count bounds on
/// arrays and objects.
fn apply_min_max(fs: &mut Schema, tag: &ValidateTag) {
    // Bounds arrive as non-negative whole numbers where a count is needed.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let as_count = |bound: f64| bound as usize;

    match fs.schema_type {
        Some(SchemaType::String) => {
            fs.min_length = tag.minimum.map(as_count).or(fs.min_length);
            fs.max_length = tag.maximum.map(as_count).or(fs.max_length);
        }
        Some(SchemaType::Integer | SchemaType::Number) => {
            if tag.minimum.is_some() {
                fs.minimum = tag.minimum;
            }
            if tag.maximum.is_some() {
                fs.maximum = tag.maximum;
            }
        }
        Some(SchemaType::Array) => {
            fs.min_items = tag.minimum.map(as_count).or(fs.min_items);
            fs.max_items = tag.maximum.map(as_count).or(fs.max_items);
        }
        Some(SchemaType::Object) => {
            fs.min_properties = tag.minimum.map(as_count).or(fs.min_properties);
            fs.max_properties = tag.maximum.map(as_count).or(fs.max_properties);
        }
        _ => {}
    }
}

/// An enumeration targets array items when the field is an array; a single
/// value collapses to `const`.
fn apply_enum(fs: &mut Schema, tag: &ValidateTag) {
    let Some(values) = &tag.enum_values else {
        return;
    };

    let mut applied = false;
    if fs.schema_type == Some(SchemaType::Array) {
        if let Some(items) = fs.items.as_deref_mut() {
            set_enum(items, values);
            applied = true;
        }
    }
    if !applied {
        set_enum(fs, values);
    }
}

fn set_enum(target: &mut Schema, values: &[serde_json::Value]) {
    if let [single] = values {
        target.const_value = Some(single.clone());
    } else {
        target.enum_values = Some(values.to_vec());
    }
}

/// Every dependent-required target must exist among the record's
/// properties. Violations are collected across the whole record before
/// failing.
fn validate_dependent_required(schema: &Schema) -> Result<(), SchemaError> {
    let mut violations = Vec::new();
    for (field, dependents) in &schema.dependent_required {
        for dependent in dependents {
            if !schema.properties.contains_key(dependent) {
                violations.push(DependentRequiredViolation {
                    field: field.clone(),
                    missing: dependent.clone(),
                });
            }
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::DependentRequired(violations))
    }
}
