//! Environment overlay driven by `#[derive(EnvConfig)]`.
//!
//! The derive emits a static [`FieldDescriptor`] table per struct and an
//! [`EnvConfig::apply_env`] walk over its public fields. Leaf fields look up
//! `prefix + path + "_" + segment` and coerce the value through
//! [`FromEnvValue`]; nested structs extend the path with their own segment
//! (or pass it through unchanged when they have none) and recurse.
//!
//! The same walk drives the config file overlay: each public field whose
//! JSON name is present in the file is decoded on its own, so fields the
//! file does not mention are never touched.

use crate::coerce::FromEnvValue;
use crate::environment::Environment;
use crate::error::{CoercionError, FieldError};
use crate::level::Level;
use serde::de::DeserializeOwned;
pub use serde_json::Value;
use std::time::Duration;

/// A JSON object as read from a config file.
pub type JsonObject = serde_json::Map<String, Value>;

/// Static description of one public field of an `EnvConfig` struct.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Rust field name
    pub name: &'static str,
    /// `(tag key, segment)` pairs from `#[tag(..)]`
    pub tags: &'static [(&'static str, &'static str)],
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Segment for the given tag key, if the field carries one.
    pub fn segment(&self, tag: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(key, _)| *key == tag)
            .map(|(_, segment)| *segment)
            .filter(|segment| !segment.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Terminal value, labelled with its [`FromEnvValue::KIND`]
    Leaf(&'static str),
    /// Nested `EnvConfig` struct
    Nested(fn() -> &'static [FieldDescriptor]),
}

/// Position in the struct tree: the accumulated environment path and the
/// dotted Rust field path used in error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPath {
    env: String,
    field: String,
}

impl EnvPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Environment key (without prefix) for a leaf segment under this path.
    pub fn key(&self, segment: &str) -> String {
        if self.env.is_empty() {
            segment.to_string()
        } else {
            format!("{}_{}", self.env, segment)
        }
    }

    /// Dotted Rust path of a field under this path.
    pub fn field_path(&self, name: &str) -> String {
        if self.field.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.field, name)
        }
    }

    /// Path for the children of a nested field. Without a segment the
    /// environment path is passed through unchanged.
    pub fn descend(&self, name: &str, segment: Option<&str>) -> Self {
        Self {
            env: match segment {
                Some(segment) => self.key(segment),
                None => self.env.clone(),
            },
            field: self.field_path(name),
        }
    }
}

/// Read side of an overlay pass: where values come from, the key prefix and
/// which tag key selects segments.
pub struct Overlay<'a> {
    env: &'a dyn Environment,
    prefix: &'a str,
    tag: &'a str,
}

impl<'a> Overlay<'a> {
    pub fn new(env: &'a dyn Environment, prefix: &'a str, tag: &'a str) -> Self {
        Self { env, prefix, tag }
    }

    pub fn tag(&self) -> &str {
        self.tag
    }

    /// Full key including the prefix.
    pub fn full_key(&self, path: &EnvPath, segment: &str) -> String {
        format!("{}{}", self.prefix, path.key(segment))
    }

    /// Value for a full key. Empty values count as absent.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.env.get(key).filter(|value| !value.is_empty())
    }
}

/// A struct whose public fields can be overlaid from the environment.
///
/// Implemented by `#[derive(EnvConfig)]`.
pub trait EnvConfig {
    fn env_fields() -> &'static [FieldDescriptor];

    fn apply_env(&mut self, overlay: &Overlay<'_>, path: &EnvPath) -> Result<(), CoercionError>;

    /// Overlay the keys of `object` onto the matching public fields.
    /// `parent` is the dotted path of `self`, empty at the root.
    fn apply_json(&mut self, object: JsonObject, parent: &str) -> Result<(), FieldError>;
}

/// A value that can sit in a field of an [`EnvConfig`] struct.
pub trait EnvField {
    const KIND: FieldKind;

    fn overlay_env(
        &mut self,
        overlay: &Overlay<'_>,
        parent: &EnvPath,
        field: &FieldDescriptor,
    ) -> Result<(), CoercionError>;

    /// Overlay a config file value. `field` is the dotted path of `self`.
    fn overlay_json(&mut self, value: Value, field: &str) -> Result<(), FieldError>;
}

/// Dotted path of `name` under `parent`.
pub fn join_field(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Overlay a leaf field. Untagged fields and absent or empty values leave
/// the current value untouched; a value that fails to parse leaves it
/// untouched too and aborts with a [`CoercionError`].
pub fn apply_leaf<T: FromEnvValue>(
    slot: &mut T,
    overlay: &Overlay<'_>,
    parent: &EnvPath,
    field: &FieldDescriptor,
) -> Result<(), CoercionError> {
    let Some(segment) = field.segment(overlay.tag()) else {
        return Ok(());
    };
    let key = overlay.full_key(parent, segment);
    let Some(raw) = overlay.lookup(&key) else {
        return Ok(());
    };

    match T::from_env_value(&raw) {
        Ok(value) => {
            *slot = value;
            Ok(())
        }
        Err(reason) => Err(CoercionError {
            field: parent.field_path(field.name),
            key,
            value: raw,
            kind: T::KIND,
            reason,
        }),
    }
}

/// Overlay a nested struct field.
pub fn apply_nested<T: EnvConfig>(
    slot: &mut T,
    overlay: &Overlay<'_>,
    parent: &EnvPath,
    field: &FieldDescriptor,
) -> Result<(), CoercionError> {
    let path = parent.descend(field.name, field.segment(overlay.tag()));
    slot.apply_env(overlay, &path)
}

/// Overlay a leaf field from a config file value. `null` keeps the current
/// value.
pub fn apply_leaf_json<T: FromEnvValue>(slot: &mut T, value: Value, field: &str) -> Result<(), FieldError> {
    if value.is_null() {
        return Ok(());
    }
    *slot = T::from_json_value(value).map_err(|reason| FieldError {
        field: field.to_string(),
        reason,
    })?;
    Ok(())
}

/// Overlay a nested struct from a config file value, key by key.
pub fn apply_nested_json<T: EnvConfig>(slot: &mut T, value: Value, field: &str) -> Result<(), FieldError> {
    match value {
        Value::Null => Ok(()),
        Value::Object(object) => slot.apply_json(object, field),
        other => Err(FieldError {
            field: field.to_string(),
            reason: format!("expected an object, found {other}"),
        }),
    }
}

/// Replace a field that takes no part in the environment overlay with its
/// serde decoding of `value`. `null` keeps the current value.
pub fn replace_json<T: DeserializeOwned>(slot: &mut T, value: Value, field: &str) -> Result<(), FieldError> {
    if value.is_null() {
        return Ok(());
    }
    *slot = serde_json::from_value(value).map_err(|e| FieldError {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Implement [`EnvField`] for types that implement [`FromEnvValue`].
///
/// ```ignore
/// impl confbuilder::FromEnvValue for Port { /* ... */ }
/// confbuilder::env_leaf!(Port);
/// ```
#[macro_export]
macro_rules! env_leaf {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::EnvField for $ty {
                const KIND: $crate::FieldKind =
                    $crate::FieldKind::Leaf(<$ty as $crate::FromEnvValue>::KIND);

                fn overlay_env(
                    &mut self,
                    overlay: &$crate::Overlay<'_>,
                    parent: &$crate::EnvPath,
                    field: &$crate::FieldDescriptor,
                ) -> ::core::result::Result<(), $crate::CoercionError> {
                    $crate::overlay::apply_leaf(self, overlay, parent, field)
                }

                fn overlay_json(
                    &mut self,
                    value: $crate::overlay::Value,
                    field: &str,
                ) -> ::core::result::Result<(), $crate::FieldError> {
                    $crate::overlay::apply_leaf_json(self, value, field)
                }
            }
        )+
    };
}

env_leaf!(
    String,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    bool,
    Duration,
    Level,
    Vec<String>,
);

impl<T: FromEnvValue> EnvField for Option<T> {
    const KIND: FieldKind = FieldKind::Leaf(T::KIND);

    fn overlay_env(
        &mut self,
        overlay: &Overlay<'_>,
        parent: &EnvPath,
        field: &FieldDescriptor,
    ) -> Result<(), CoercionError> {
        apply_leaf(self, overlay, parent, field)
    }

    fn overlay_json(&mut self, value: Value, field: &str) -> Result<(), FieldError> {
        apply_leaf_json(self, value, field)
    }
}

/// One environment key the overlay consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKey {
    /// Full key including the prefix
    pub key: String,
    /// Dotted Rust field path
    pub field: String,
    pub kind: &'static str,
}

/// Every key an overlay of `T` with this prefix and tag key would read, in
/// declaration order.
pub fn env_keys<T: EnvConfig>(prefix: &str, tag: &str) -> Vec<EnvKey> {
    let mut keys = Vec::new();
    collect_keys(T::env_fields(), prefix, tag, &EnvPath::root(), &mut keys);
    keys
}

fn collect_keys(
    fields: &[FieldDescriptor],
    prefix: &str,
    tag: &str,
    path: &EnvPath,
    out: &mut Vec<EnvKey>,
) {
    for field in fields {
        match field.kind {
            FieldKind::Nested(children) => {
                let child = path.descend(field.name, field.segment(tag));
                collect_keys(children(), prefix, tag, &child, out);
            }
            FieldKind::Leaf(kind) => {
                if let Some(segment) = field.segment(tag) {
                    out.push(EnvKey {
                        key: format!("{}{}", prefix, path.key(segment)),
                        field: path.field_path(field.name),
                        kind,
                    });
                }
            }
        }
    }
}
