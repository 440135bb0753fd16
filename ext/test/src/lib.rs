//! datashape-test: Test domain for conformance testing
//!
//! Provides a sample class ([`Timestamp`]), a JSON encoding for its instances
//! so fixtures can carry them, and the hooks the conformance fixtures refer
//! to by name.
//!
//! # Example
//!
//! ```
//! use datashape_test::prelude::*;
//! use serde_json::json;
//!
//! // Fixture JSON with a class marker decodes to a class instance
//! let value = decode(json!({ "$class": "Timestamp", "millis": 1000 }));
//! assert_eq!(value.as_custom().map(|c| c.class_name()), Some("Timestamp"));
//!
//! // and encodes back to the same JSON
//! assert_eq!(value.to_json().unwrap(), json!({ "$class": "Timestamp", "millis": 1000 }));
//! ```

use std::any::Any;
use std::sync::Arc;

use datashape::prelude::*;
use serde_json::Value as Json;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Key marking a JSON object as an encoded class instance.
pub const CLASS_KEY: &str = "$class";

/// A point in time, in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    millis: i64,
}

impl Timestamp {
    /// Class name used in schemas and encoded JSON.
    pub const CLASS: &'static str = "Timestamp";

    /// Create a timestamp.
    #[must_use]
    pub fn new(millis: i64) -> Self {
        Self { millis }
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub fn millis(self) -> i64 {
        self.millis
    }

    /// Wrap as a [`Value::Custom`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Custom(Arc::new(self))
    }
}

impl CustomValue for Timestamp {
    fn class_name(&self) -> &'static str {
        Self::CLASS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Json {
        serde_json::json!({ CLASS_KEY: Self::CLASS, "millis": self.millis })
    }
}

/// Convert fixture JSON into a [`Value`].
///
/// `{ "$class": "Timestamp", "millis": n }` becomes a [`Timestamp`]; everything
/// else converts as plain JSON.
#[must_use]
pub fn decode(json: Json) -> Value {
    match json {
        Json::Object(map) if map.get(CLASS_KEY).and_then(Json::as_str) == Some(Timestamp::CLASS) => {
            match map.get("millis").and_then(Json::as_i64) {
                Some(millis) => Timestamp::new(millis).into_value(),
                None => Value::from(Json::Object(map)),
            }
        }
        Json::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, decode(v)))),
        Json::Array(items) => Value::array(items.into_iter().map(decode)),
        other => Value::from(other),
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{decode, Timestamp, CLASS_KEY};
    pub use datashape::prelude::*;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry support (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

/// Register all datashape-test types with the given builder.
///
/// Registers the built-in hooks plus:
/// - class `Timestamp` → [`Timestamp`]
/// - validate hook `positive`: rejects numbers `<= 0`
/// - init hook `timestamp`: turns a number of milliseconds into a [`Timestamp`]
#[cfg(feature = "registry")]
#[must_use]
pub fn register(builder: datashape::RegistryBuilder) -> datashape::RegistryBuilder {
    datashape::register_builtin_hooks(builder)
        .class(ClassRef::of::<Timestamp>(Timestamp::CLASS))
        .validator("positive", |value, _| {
            value
                .as_f64()
                .is_some_and(|n| n <= 0.0)
                .then(|| "must be positive".to_owned())
        })
        .initializer("timestamp", |value, _| match value.as_f64() {
            #[allow(clippy::cast_possible_truncation)]
            Some(millis) => Timestamp::new(millis as i64).into_value(),
            None => value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_json() {
        let value = decode(json!({ "a": [1, "x"], "b": null }));
        assert_eq!(value.to_json().unwrap(), json!({ "a": [1, "x"], "b": null }));
    }

    #[test]
    fn test_decode_nested_timestamp() {
        let value = decode(json!({ "at": { "$class": "Timestamp", "millis": 5 } }));
        let at = value.get_field("at");
        let ts = at
            .as_custom()
            .and_then(|c| c.as_any().downcast_ref::<Timestamp>())
            .copied();
        assert_eq!(ts, Some(Timestamp::new(5)));
    }

    #[test]
    fn test_decode_incomplete_marker_stays_object() {
        let value = decode(json!({ "$class": "Timestamp" }));
        assert!(value.as_object().is_some());
    }

    #[test]
    fn test_class_match() {
        let schema: Schema = ClassRef::of::<Timestamp>(Timestamp::CLASS).into();
        assert!(match_structure(&Timestamp::new(0).into_value(), &schema).is_match());

        let err = validate(Value::from(0), &schema).unwrap_err();
        assert_eq!(err.to_string(), "argument should be of type Timestamp");
    }

    #[cfg(feature = "registry")]
    #[test]
    fn test_register() {
        let registry = register(datashape::RegistryBuilder::new()).build();
        assert!(registry.contains_class("Timestamp"));
        assert!(registry.contains_validator("positive"));
        assert!(registry.contains_initializer("timestamp"));
        assert!(registry.contains_initializer("trim"));
    }

    #[cfg(feature = "registry")]
    #[test]
    fn test_timestamp_initializer_normalizes_numbers() {
        let registry = register(datashape::RegistryBuilder::new()).build();
        let config = serde_json::from_value(json!({
            "type": ["number", "Timestamp"],
            "init": "timestamp"
        }))
        .unwrap();
        let shape = registry.load_shape(config).unwrap();

        let from_number = shape.validate(Value::from(42)).unwrap();
        assert_eq!(
            from_number.to_json().unwrap(),
            json!({ "$class": "Timestamp", "millis": 42 })
        );

        let original = Timestamp::new(7).into_value();
        let kept = shape.validate(original.clone()).unwrap();
        assert_eq!(kept, original);
    }
}
