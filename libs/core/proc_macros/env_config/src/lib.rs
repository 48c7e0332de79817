//! EnvConfig derive macro for environment-variable overlays.
//!
//! This crate provides the [`EnvConfig`](macro@EnvConfig) derive macro used by
//! `confbuilder`. It generates a static field descriptor table and the walk
//! that overlays environment values onto a struct's public fields.
//!
//! # Examples
//!
//! ```ignore
//! use confbuilder::EnvConfig;
//!
//! #[derive(EnvConfig)]
//! pub struct DatabaseConfig {
//!     #[tag(env = "HOST")]
//!     pub host: String,
//!     #[tag(env = "PORT")]
//!     pub port: u16,
//! }
//!
//! #[derive(EnvConfig)]
//! pub struct AppConfig {
//!     #[tag(env = "DB")]
//!     pub database: DatabaseConfig, // DB_HOST, DB_PORT
//!
//!     pub internal_id: String, // no tag: never overlaid
//!     secret: String,          // private: never touched
//! }
//! ```
//!
//! Several tag keys can be attached to one field; the builder's `env_tag`
//! picks which one is used:
//!
//! ```ignore
//! #[derive(EnvConfig)]
//! pub struct ServiceConfig {
//!     #[tag(env = "HOST", k8s = "SERVICE_HOST")]
//!     pub host: String,
//! }
//! ```

extern crate proc_macro;

use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{DeriveInput, Token, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs(serde))]
struct EnvConfigInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<(), EnvConfigField>,
    attrs: Vec<syn::Attribute>,
}

#[derive(FromField)]
#[darling(forward_attrs(tag, serde))]
struct EnvConfigField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    vis: syn::Visibility,
    attrs: Vec<syn::Attribute>,
}

/// Derives `confbuilder::EnvConfig` and `confbuilder::EnvField`.
///
/// # Attributes
///
/// - `#[tag(key = "SEGMENT", ...)]` on a field: the environment segment for
///   each tag key. Leaf fields are read from `prefix + path + SEGMENT`;
///   nested struct fields append `SEGMENT` to the path of their children.
/// - `#[tag(skip)]` on a field: never read from the environment. The field
///   may have any type that implements `serde::Deserialize`; config files
///   still overlay it.
///
/// Only `pub` fields (including `pub(crate)` and similar) are visited. Every
/// other visited field type must implement `confbuilder::EnvField`: the
/// built-in leaves, `Option` of a leaf, another `#[derive(EnvConfig)]`
/// struct, or a type registered with `confbuilder::env_leaf!`.
///
/// Config file keys follow the serde names: `#[serde(rename_all = "..")]`
/// on the struct and `#[serde(rename = "..")]` on fields are honoured, and
/// `#[serde(skip)]` / `#[serde(skip_deserializing)]` fields are left alone.
#[proc_macro_derive(EnvConfig, attributes(tag, serde))]
pub fn env_config_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = parse_macro_input!(input as DeriveInput);
    let receiver = match EnvConfigInput::from_derive_input(&ast) {
        Ok(receiver) => receiver,
        Err(err) => return TokenStream::from(err.write_errors()),
    };
    match impl_env_config(receiver) {
        Ok(tokens) => tokens.into(),
        Err(err) => TokenStream::from(err.write_errors()),
    }
}

#[derive(Default)]
struct FieldTags {
    skip: bool,
    segments: Vec<(String, String)>,
}

/// Collect `(key, segment)` pairs, or the `skip` marker, from every
/// `#[tag(..)]` on a field.
fn parse_tags(attrs: &[syn::Attribute]) -> darling::Result<FieldTags> {
    let mut errors = darling::Error::accumulator();
    let mut tags = FieldTags::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("tag")) {
        let result = attr.parse_nested_meta(|meta| {
            let key = meta
                .path
                .get_ident()
                .ok_or_else(|| meta.error("expected a tag key such as `env`"))?
                .unraw()
                .to_string();
            if key == "skip" && !meta.input.peek(Token![=]) {
                tags.skip = true;
                return Ok(());
            }
            let segment: syn::LitStr = meta.value()?.parse()?;
            if segment.value().is_empty() {
                return Err(syn::Error::new(segment.span(), "tag segment must not be empty"));
            }
            if tags.segments.iter().any(|(existing, _)| *existing == key) {
                return Err(meta.error(format!("duplicate tag key `{key}`")));
            }
            tags.segments.push((key, segment.value()));
            Ok(())
        });
        if let Err(err) = result {
            errors.push(darling::Error::from(err));
        }
    }

    if tags.skip && !tags.segments.is_empty() {
        errors.push(darling::Error::custom("`skip` cannot be combined with tag segments"));
    }

    errors.finish_with(tags)
}

/// Consume the value of a serde option this derive does not care about.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: proc_macro2::TokenStream = content.parse()?;
    }
    Ok(())
}

/// Name used when deserializing, from `name = ".."` or
/// `name(deserialize = "..")`.
fn deserialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let lit: syn::LitStr = meta.value()?.parse()?;
        return Ok(Some(lit.value()));
    }
    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("deserialize") {
            let lit: syn::LitStr = inner.value()?.parse()?;
            name = Some(lit.value());
            Ok(())
        } else {
            skip_meta(&inner)
        }
    })?;
    Ok(name)
}

fn parse_serde<F>(attrs: &[syn::Attribute], mut visit: F) -> darling::Result<()>
where
    F: FnMut(&str, &ParseNestedMeta) -> syn::Result<bool>,
{
    let mut errors = darling::Error::accumulator();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let result = attr.parse_nested_meta(|meta| {
            let key = meta.path.get_ident().map(|ident| ident.to_string()).unwrap_or_default();
            if visit(&key, &meta)? {
                Ok(())
            } else {
                skip_meta(&meta)
            }
        });
        if let Err(err) = result {
            errors.push(darling::Error::from(err));
        }
    }
    errors.finish()
}

#[derive(Default)]
struct SerdeField {
    rename: Option<String>,
    skip: bool,
    flatten: bool,
}

fn parse_serde_field(attrs: &[syn::Attribute]) -> darling::Result<SerdeField> {
    let mut field = SerdeField::default();
    parse_serde(attrs, |key, meta| {
        match key {
            "rename" => {
                if let Some(rename) = deserialize_name(meta)? {
                    field.rename = Some(rename);
                }
            }
            "skip" | "skip_deserializing" => field.skip = true,
            "flatten" => field.flatten = true,
            _ => return Ok(false),
        }
        Ok(true)
    })?;
    Ok(field)
}

fn parse_rename_all(attrs: &[syn::Attribute]) -> darling::Result<Option<String>> {
    let mut rule = None;
    parse_serde(attrs, |key, meta| {
        if key != "rename_all" {
            return Ok(false);
        }
        if let Some(value) = deserialize_name(meta)? {
            if rename_field(&value, "a_b").is_none() {
                return Err(meta.error(format!("unknown rename_all rule `{value}`")));
            }
            rule = Some(value);
        }
        Ok(true)
    })?;
    Ok(rule)
}

/// Apply a serde `rename_all` rule to a snake_case field name.
fn rename_field(rule: &str, field: &str) -> Option<String> {
    let pascal = || {
        let mut out = String::with_capacity(field.len());
        let mut capitalize = true;
        for ch in field.chars() {
            if ch == '_' {
                capitalize = true;
            } else if capitalize {
                out.extend(ch.to_uppercase());
                capitalize = false;
            } else {
                out.push(ch);
            }
        }
        out
    };

    Some(match rule {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_ascii_uppercase(),
        "PascalCase" => pascal(),
        "camelCase" => {
            let pascal = pascal();
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => pascal,
            }
        }
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.to_ascii_uppercase().replace('_', "-"),
        _ => return None,
    })
}

fn impl_env_config(receiver: EnvConfigInput) -> darling::Result<proc_macro2::TokenStream> {
    let ident = &receiver.ident;

    if !receiver.generics.params.is_empty() {
        return Err(darling::Error::custom("EnvConfig cannot be derived for generic structs")
            .with_span(&receiver.generics));
    }

    let fields = match receiver.data {
        darling::ast::Data::Struct(fields) => fields.fields,
        darling::ast::Data::Enum(_) => {
            return Err(darling::Error::unsupported_shape("enum"));
        }
    };

    let mut errors = darling::Error::accumulator();
    let rename_all = errors.handle(parse_rename_all(&receiver.attrs)).flatten();
    let mut descriptors = Vec::new();
    let mut applies = Vec::new();
    let mut json_applies = Vec::new();

    for field in fields {
        // Private fields are neither described nor overlaid
        if matches!(field.vis, syn::Visibility::Inherited) {
            continue;
        }
        let Some(field_ident) = field.ident else {
            continue;
        };
        let Some(tags) = errors.handle(parse_tags(&field.attrs)) else {
            continue;
        };
        let Some(serde) = errors.handle(parse_serde_field(&field.attrs)) else {
            continue;
        };
        if serde.flatten {
            errors.push(
                darling::Error::custom("EnvConfig does not support `#[serde(flatten)]`").with_span(&field_ident),
            );
            continue;
        }

        let ty = &field.ty;
        let name = field_ident.unraw().to_string();
        let json_key = match (serde.rename, &rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rename_field(rule, &name).unwrap_or_else(|| name.clone()),
            (None, None) => name.clone(),
        };

        if !serde.skip {
            let overlay = if tags.skip {
                quote!(::confbuilder::overlay::replace_json(&mut self.#field_ident, value, &field)?;)
            } else {
                quote!(::confbuilder::EnvField::overlay_json(&mut self.#field_ident, value, &field)?;)
            };
            json_applies.push(quote! {
                if let ::core::option::Option::Some(value) = object.remove(#json_key) {
                    let field = ::confbuilder::overlay::join_field(parent, #name);
                    #overlay
                }
            });
        }

        if tags.skip {
            continue;
        }

        let keys = tags.segments.iter().map(|(key, _)| key);
        let segments = tags.segments.iter().map(|(_, segment)| segment);
        let index = descriptors.len();

        descriptors.push(quote! {
            ::confbuilder::FieldDescriptor {
                name: #name,
                tags: &[#((#keys, #segments)),*],
                kind: <#ty as ::confbuilder::EnvField>::KIND,
            }
        });
        applies.push(quote! {
            ::confbuilder::EnvField::overlay_env(&mut self.#field_ident, overlay, path, &fields[#index])?;
        });
    }

    errors.finish()?;

    Ok(quote! {
        impl ::confbuilder::EnvConfig for #ident {
            fn env_fields() -> &'static [::confbuilder::FieldDescriptor] {
                const FIELDS: &[::confbuilder::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            #[allow(unused_variables)]
            fn apply_env(
                &mut self,
                overlay: &::confbuilder::Overlay<'_>,
                path: &::confbuilder::EnvPath,
            ) -> ::core::result::Result<(), ::confbuilder::CoercionError> {
                let fields = <Self as ::confbuilder::EnvConfig>::env_fields();
                #(#applies)*
                ::core::result::Result::Ok(())
            }

            #[allow(unused_mut, unused_variables)]
            fn apply_json(
                &mut self,
                mut object: ::confbuilder::JsonObject,
                parent: &str,
            ) -> ::core::result::Result<(), ::confbuilder::FieldError> {
                #(#json_applies)*
                ::core::result::Result::Ok(())
            }
        }

        impl ::confbuilder::EnvField for #ident {
            const KIND: ::confbuilder::FieldKind =
                ::confbuilder::FieldKind::Nested(<#ident as ::confbuilder::EnvConfig>::env_fields);

            fn overlay_env(
                &mut self,
                overlay: &::confbuilder::Overlay<'_>,
                parent: &::confbuilder::EnvPath,
                field: &::confbuilder::FieldDescriptor,
            ) -> ::core::result::Result<(), ::confbuilder::CoercionError> {
                ::confbuilder::overlay::apply_nested(self, overlay, parent, field)
            }

            fn overlay_json(
                &mut self,
                value: ::confbuilder::overlay::Value,
                field: &str,
            ) -> ::core::result::Result<(), ::confbuilder::FieldError> {
                ::confbuilder::overlay::apply_nested_json(self, value, field)
            }
        }
    })
}
