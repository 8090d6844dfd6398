//! Derive macro producing `tagschema` type descriptors.
//!
//! `#[derive(Describe)]` on a named-field struct emits the `Describe`
//! implementation: type identity, declared name, the ordered field list
//! with raw annotation strings, and any generation overrides.
//!
//! Field attributes (all take a tag string):
//! `#[describe(validate = "...")]`, `#[describe(openapi = "...")]`,
//! `#[describe(schema = "...")]`, `#[describe(default = "...")]`,
//! `#[describe(dependent_required = "...")]`, plus `#[describe(skip)]` to
//! leave a field out of the descriptor entirely.
//!
//! Container attributes: `#[describe(rename = "...")]` overrides the
//! declared name, `#[describe(text)]` marks the type as text-representable,
//! `#[describe(schema_with = "path")]` names a function providing the whole
//! schema, `#[describe(transform_with = "path")]` names a post-generation
//! rewrite, and `#[describe(struct_options = "...")]` carries record-level
//! options.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derives the `Describe` trait for a named-field struct.
#[proc_macro_derive(Describe, attributes(describe))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct ContainerOptions {
    rename: Option<String>,
    text: bool,
    schema_with: Option<syn::Path>,
    transform_with: Option<syn::Path>,
    struct_options: Option<String>,
}

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    /// `(namespace, raw tag)` pairs in attribute order.
    tags: Vec<(&'static str, String)>,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Describe can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Describe requires named fields",
        ));
    };

    let container = parse_container_options(&input)?;

    let ident = &input.ident;
    // The full type path feeds the schema namer, which flattens it (and any
    // generic arguments) into a bare schema name.
    let type_name = match &container.rename {
        Some(name) => quote! { #name },
        None => quote! { ::std::any::type_name::<Self>() },
    };

    let mut decls = Vec::new();
    let mut index = 0usize;
    for field in &fields.named {
        let options = parse_field_options(field)?;
        if options.skip {
            index += 1;
            continue;
        }

        let field_ident = field.ident.as_ref().unwrap();
        let field_name = field_ident.to_string();
        let field_ty = &field.ty;
        let tag_pairs = options.tags.iter().map(|(namespace, raw)| {
            quote! { (#namespace, #raw) }
        });

        decls.push(quote! {
            ::tagschema::FieldDecl {
                name: #field_name,
                index: #index,
                ty: <#field_ty as ::tagschema::Describe>::type_info,
                tags: &[#(#tag_pairs),*],
            }
        });
        index += 1;
    }

    // Record-level options ride on the reserved sentinel field.
    if let Some(raw) = &container.struct_options {
        decls.push(quote! {
            ::tagschema::FieldDecl {
                name: ::tagschema::SENTINEL_FIELD,
                index: #index,
                ty: <() as ::tagschema::Describe>::type_info,
                tags: &[("openapiStruct", #raw)],
            }
        });
    }

    let provide = match &container.schema_with {
        Some(path) => quote! { ::std::option::Option::Some(#path) },
        None => quote! { ::std::option::Option::None },
    };
    let transform = match &container.transform_with {
        Some(path) => quote! { ::std::option::Option::Some(#path) },
        None => quote! { ::std::option::Option::None },
    };
    let text = container.text;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!(::tagschema::Describe));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::tagschema::Describe for #ident #ty_generics #where_clause {
            fn type_info() -> ::tagschema::TypeInfo {
                ::tagschema::TypeInfo {
                    id: ::std::any::TypeId::of::<Self>(),
                    name: #type_name,
                    shape: ::tagschema::Shape::Struct {
                        fields: || ::std::vec![#(#decls),*],
                    },
                    overrides: ::tagschema::Overrides {
                        provide: #provide,
                        text: #text,
                        transform: #transform,
                    },
                }
            }
        }
    })
}

fn parse_container_options(input: &DeriveInput) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("text") {
                options.text = true;
            } else if meta.path.is_ident("schema_with") {
                options.schema_with = Some(meta.value()?.parse::<LitStr>()?.parse()?);
            } else if meta.path.is_ident("transform_with") {
                options.transform_with = Some(meta.value()?.parse::<LitStr>()?.parse()?);
            } else if meta.path.is_ident("struct_options") {
                options.struct_options = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unknown describe container option"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn parse_field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("describe") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }
            let namespace = if meta.path.is_ident("schema") {
                "schema"
            } else if meta.path.is_ident("validate") {
                "validate"
            } else if meta.path.is_ident("openapi") {
                "openapi"
            } else if meta.path.is_ident("default") {
                "default"
            } else if meta.path.is_ident("dependent_required") {
                "dependentRequired"
            } else {
                return Err(meta.error("unknown describe field option"));
            };
            let raw = meta.value()?.parse::<LitStr>()?.value();
            options.tags.push((namespace, raw));
            Ok(())
        })?;
    }
    Ok(options)
}
