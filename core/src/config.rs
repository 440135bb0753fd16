//! Config types for config-driven schema construction.
//!
//! These types mirror the runtime schema model but are serde-deserializable,
//! so schemas can live in JSON/YAML files and be loaded via
//! [`Registry::load_schema()`](crate::Registry::load_schema).
//!
//! # Relationship to runtime types
//!
//! | Config shape | Runtime type |
//! |--------------|--------------|
//! | `"*"`, `"number"`, ... | [`Schema::Any`](crate::Schema::Any), [`Schema::Primitive`](crate::Schema::Primitive) |
//! | `"Timestamp"` (registered class) | [`Schema::Class`](crate::Schema::Class) |
//! | `[a, b, ...]` | [`Schema::OneOf`](crate::Schema::OneOf) |
//! | `{ type: ..., fields: [...] }` | [`Schema::Descriptor`](crate::Schema::Descriptor) |
//!
//! Hooks are code, so config refers to them by registered name.

use serde::{Deserialize, Deserializer};

/// Configuration for a [`Schema`](crate::Schema).
///
/// Untagged: the JSON shape picks the variant.
///
/// ```json
/// "string"
/// ["string", "number"]
/// { "type": "object", "fields": [{ "name": "id", "type": "number" }] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    /// A type name: `"*"`, a primitive, or a registered class.
    Named(String),
    /// Alternatives.
    OneOf(Vec<SchemaConfig>),
    /// A descriptor.
    Descriptor(Box<DescriptorConfig>),
}

/// Configuration for a [`Descriptor`](crate::Descriptor).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorConfig {
    /// The type the value must have.
    #[serde(rename = "type")]
    pub ty: SchemaConfig,

    /// Field name, for entries of a parent's `fields`.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared fields, scanned in order.
    #[serde(default)]
    pub fields: Vec<DescriptorConfig>,

    /// Schema for unlisted fields.
    #[serde(default, alias = "childType")]
    pub child_type: Option<SchemaConfig>,

    /// Default value. An explicit `null` is a default too.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub default: Option<serde_json::Value>,

    /// Name of a registered validate hook.
    #[serde(default)]
    pub validate: Option<String>,

    /// Name of a registered init hook.
    #[serde(default)]
    pub init: Option<String>,
}

// Present-but-null must stay distinguishable from absent.
fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}
