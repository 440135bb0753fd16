//! Registry for config-driven schema construction.
//!
//! Config files can name primitives and the wildcard directly, but classes
//! and hooks are code. The registry maps names to them so a
//! [`SchemaConfig`] can be turned into a runtime [`Schema`].
//!
//! # Three extension seams
//!
//! | Seam | Builder method | Config key |
//! |------|----------------|------------|
//! | Classes | `builder.class(ClassRef)` | any type name |
//! | Validate hooks | `builder.validator(name, f)` | `validate` |
//! | Init hooks | `builder.initializer(name, f)` | `init` |
//!
//! # Example
//!
//! ```
//! use datashape::{register_builtin_hooks, RegistryBuilder, SchemaConfig, Value};
//!
//! let registry = register_builtin_hooks(RegistryBuilder::new()).build();
//!
//! let config: SchemaConfig = serde_json::from_str(
//!     r#"{ "type": "object", "fields": [{ "name": "tag", "type": "string", "init": "trim" }] }"#,
//! ).unwrap();
//! let shape = registry.load_shape(config).unwrap();
//!
//! let out = shape.validate(Value::from(serde_json::json!({ "tag": " a " }))).unwrap();
//! assert_eq!(out.get_field("tag"), Value::from("a"));
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::{DescriptorConfig, SchemaConfig},
    ClassRef, Descriptor, InitHook, Schema, SchemaError, Shape, ValidateHook, Value, MAX_DEPTH,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Builder for constructing a [`Registry`].
///
/// Register classes and hooks by name, then call [`build()`](Self::build) to
/// produce an immutable `Registry`. Registering a name twice keeps the last.
#[derive(Default)]
pub struct RegistryBuilder {
    classes: HashMap<String, ClassRef>,
    validators: HashMap<String, ValidateHook>,
    initializers: HashMap<String, InitHook>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its own name.
    #[must_use]
    pub fn class(mut self, class: ClassRef) -> Self {
        self.classes.insert(class.name().to_owned(), class);
        self
    }

    /// Register a validate hook.
    #[must_use]
    pub fn validator(
        mut self,
        name: &str,
        f: impl Fn(&Value, &str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validators
            .insert(name.to_owned(), ValidateHook::new(f).labeled(name));
        self
    }

    /// Register an init hook.
    #[must_use]
    pub fn initializer(
        mut self,
        name: &str,
        f: impl Fn(Value, &str) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.initializers
            .insert(name.to_owned(), InitHook::new(f).labeled(name));
        self
    }

    /// Freeze the registry. No further registration is possible.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            classes: self.classes,
            validators: self.validators,
            initializers: self.initializers,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Built-in hooks
// ═══════════════════════════════════════════════════════════════════════════════

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

/// Register the built-in hooks.
///
/// | Name | Kind | Effect |
/// |------|------|--------|
/// | `non_empty` | validate | rejects `""`, `[]` and `{}` |
/// | `integer` | validate | rejects numbers with a fractional part |
/// | `identifier` | validate | rejects strings that are not `[A-Za-z_][A-Za-z0-9_]*` |
/// | `trim` | init | trims surrounding whitespace off strings |
/// | `lowercase` | init | lower-cases strings |
/// | `to_array` | init | wraps a non-array value in an array (`undefined` becomes `[]`) |
///
/// Hooks ignore values of kinds they do not handle; type checks belong to the
/// schema.
#[must_use]
pub fn register_builtin_hooks(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .validator("non_empty", |value, _| {
            let empty = match value {
                Value::String(s) => s.is_empty(),
                Value::Array(a) => a.is_empty(),
                Value::Object(o) => o.is_empty(),
                _ => false,
            };
            empty.then(|| "must not be empty".to_owned())
        })
        .validator("integer", |value, _| {
            value
                .as_f64()
                .is_some_and(|n| n.fract() != 0.0)
                .then(|| "must be an integer".to_owned())
        })
        .validator("identifier", |value, _| {
            value
                .as_str()
                .is_some_and(|s| !IDENTIFIER.is_match(s))
                .then(|| "must be an identifier".to_owned())
        })
        .initializer("trim", |value, _| match value.as_str() {
            Some(s) => Value::from(s.trim()),
            None => value,
        })
        .initializer("lowercase", |value, _| match value.as_str() {
            Some(s) => Value::from(s.to_lowercase()),
            None => value,
        })
        .initializer("to_array", |value, _| match value {
            Value::Array(_) => value,
            Value::Undefined => Value::array(Vec::<Value>::new()),
            other => Value::array([other]),
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable registry of classes and hooks.
///
/// Constructed via [`RegistryBuilder`]. Use [`load_schema()`](Self::load_schema)
/// to turn config into a runtime [`Schema`].
pub struct Registry {
    classes: HashMap<String, ClassRef>,
    validators: HashMap<String, ValidateHook>,
    initializers: HashMap<String, InitHook>,
}

impl Registry {
    /// Load a `Schema` from configuration.
    ///
    /// Resolves every type and hook name, then runs [`Schema::check`].
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`]: a type name is neither a primitive nor a registered class
    /// - [`SchemaError::UnknownHook`]: a hook name is not registered
    /// - [`SchemaError::DepthExceeded`]: nesting exceeds [`MAX_DEPTH`]
    /// - any other error of [`Schema::check`]
    pub fn load_schema(&self, config: SchemaConfig) -> Result<Schema, SchemaError> {
        let schema = self.resolve(config, 1)?;
        schema.check()?;
        Ok(schema)
    }

    /// Load a checked [`Shape`] from configuration.
    ///
    /// # Errors
    ///
    /// Same as [`load_schema()`](Self::load_schema).
    pub fn load_shape(&self, config: SchemaConfig) -> Result<Shape, SchemaError> {
        Shape::new(self.load_schema(config)?)
    }

    /// Returns `true` if a class with this name is registered.
    #[must_use]
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Returns `true` if a validate hook with this name is registered.
    #[must_use]
    pub fn contains_validator(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Returns `true` if an init hook with this name is registered.
    #[must_use]
    pub fn contains_initializer(&self, name: &str) -> bool {
        self.initializers.contains_key(name)
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        sorted_keys(&self.classes)
    }

    /// Registered validate hook names, sorted.
    #[must_use]
    pub fn validator_names(&self) -> Vec<&str> {
        sorted_keys(&self.validators)
    }

    /// Registered init hook names, sorted.
    #[must_use]
    pub fn initializer_names(&self) -> Vec<&str> {
        sorted_keys(&self.initializers)
    }

    fn resolve(&self, config: SchemaConfig, depth: usize) -> Result<Schema, SchemaError> {
        if depth > MAX_DEPTH {
            return Err(SchemaError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }
        match config {
            SchemaConfig::Named(name) => self.resolve_name(&name),
            SchemaConfig::OneOf(candidates) => candidates
                .into_iter()
                .map(|c| self.resolve(c, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Schema::OneOf),
            SchemaConfig::Descriptor(descriptor) => self
                .resolve_descriptor(*descriptor, depth)
                .map(Schema::from),
        }
    }

    fn resolve_name(&self, name: &str) -> Result<Schema, SchemaError> {
        if let Ok(schema) = Schema::named(name) {
            return Ok(schema);
        }
        self.classes
            .get(name)
            .cloned()
            .map(Schema::Class)
            .ok_or_else(|| SchemaError::UnknownType {
                name: name.to_owned(),
                available: owned(self.class_names()),
            })
    }

    fn resolve_descriptor(
        &self,
        config: DescriptorConfig,
        depth: usize,
    ) -> Result<Descriptor, SchemaError> {
        let mut descriptor = Descriptor::new(self.resolve(config.ty, depth + 1)?);
        descriptor.name = config.name;
        descriptor.fields = config
            .fields
            .into_iter()
            .map(|f| self.resolve_descriptor(f, depth + 1))
            .collect::<Result<_, _>>()?;
        descriptor.child_type = config
            .child_type
            .map(|c| self.resolve(c, depth + 1))
            .transpose()?;
        descriptor.default = config.default.map(Value::from);
        descriptor.validate = config
            .validate
            .map(|name| self.validator_hook(&name))
            .transpose()?;
        descriptor.init = config
            .init
            .map(|name| self.initializer_hook(&name))
            .transpose()?;
        Ok(descriptor)
    }

    fn validator_hook(&self, name: &str) -> Result<ValidateHook, SchemaError> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownHook {
                kind: "validate",
                name: name.to_owned(),
                available: owned(self.validator_names()),
            })
    }

    fn initializer_hook(&self, name: &str) -> Result<InitHook, SchemaError> {
        self.initializers
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownHook {
                kind: "init",
                name: name.to_owned(),
                available: owned(self.initializer_names()),
            })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.class_names())
            .field("validators", &self.validator_names())
            .field("initializers", &self.initializer_names())
            .finish()
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CustomValue, Primitive};
    use serde_json::json;
    use std::any::Any;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Timestamp;

    impl CustomValue for Timestamp {
        fn class_name(&self) -> &'static str {
            "Timestamp"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry() -> Registry {
        register_builtin_hooks(RegistryBuilder::new())
            .class(ClassRef::of::<Timestamp>("Timestamp"))
            .build()
    }

    fn config(json: serde_json::Value) -> SchemaConfig {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn load_primitive_and_wildcard() {
        let registry = registry();
        assert!(matches!(
            registry.load_schema(config(json!("Number"))),
            Ok(Schema::Primitive(Primitive::Number))
        ));
        assert!(matches!(registry.load_schema(config(json!("*"))), Ok(Schema::Any)));
    }

    #[test]
    fn load_registered_class() {
        let schema = registry().load_schema(config(json!("Timestamp"))).unwrap();
        let shape = Shape::new(schema).unwrap();
        assert!(shape.match_value(&Value::Custom(Arc::new(Timestamp))).is_match());
    }

    #[test]
    fn unknown_type_lists_classes() {
        let err = registry().load_schema(config(json!("Date"))).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                name: "Date".into(),
                available: vec!["Timestamp".into()],
            }
        );
    }

    #[test]
    fn unknown_hook_lists_hooks() {
        let err = registry()
            .load_schema(config(json!({ "type": "string", "init": "upper" })))
            .unwrap_err();
        let SchemaError::UnknownHook { kind, available, .. } = err else {
            panic!("expected UnknownHook, got {err:?}");
        };
        assert_eq!(kind, "init");
        assert_eq!(available, vec!["lowercase", "to_array", "trim"]);
    }

    #[test]
    fn load_runs_schema_check() {
        let err = registry()
            .load_schema(config(json!({ "type": "object", "fields": [{ "type": "number" }] })))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnnamedField { .. }));

        let err = registry().load_schema(config(json!([]))).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyAlternatives { .. }));
    }

    #[test]
    fn depth_limit_during_resolve() {
        let mut json = json!("number");
        for _ in 0..=MAX_DEPTH {
            json = json!([json]);
        }
        let err = registry().load_schema(config(json)).unwrap_err();
        assert!(matches!(err, SchemaError::DepthExceeded { .. }));
    }

    #[test]
    fn loaded_schema_validates() {
        let shape = registry()
            .load_shape(config(json!({
                "type": "object",
                "fields": [
                    { "name": "id", "type": "string", "validate": "identifier" },
                    { "name": "tags", "type": "array", "childType": "string", "init": "to_array", "default": [] },
                    { "name": "count", "type": "number", "validate": "integer", "default": 1 }
                ]
            })))
            .unwrap();

        let out = shape.validate(Value::from(json!({ "id": "user_1" }))).unwrap();
        assert_eq!(
            out.to_json().unwrap(),
            json!({ "id": "user_1", "tags": [], "count": 1 })
        );

        let err = shape.validate(Value::from(json!({ "id": "1user", "count": 1.5 }))).unwrap_err();
        assert_eq!(
            err.report().to_json(),
            json!({ "id": "must be an identifier", "count": "must be an integer" })
        );
    }

    #[test]
    fn builtin_initializers() {
        let registry = registry();
        let lower = registry
            .load_shape(config(json!({ "type": "string", "init": "lowercase" })))
            .unwrap();
        assert_eq!(lower.validate(Value::from("AbC")).unwrap(), Value::from("abc"));

        let wrap = registry
            .load_shape(config(json!({ "type": "*", "init": "to_array" })))
            .unwrap();
        let out = wrap.validate(Value::from("x")).unwrap();
        assert_eq!(out.to_json().unwrap(), json!(["x"]));
    }

    #[test]
    fn non_empty_validator() {
        let shape = registry()
            .load_shape(config(json!({ "type": ["string", "array"], "validate": "non_empty" })))
            .unwrap();
        assert!(shape.validate(Value::from("a")).is_ok());
        assert_eq!(
            shape.validate(Value::from(json!([]))).unwrap_err().to_string(),
            "argument must not be empty"
        );
    }

    #[test]
    fn names_are_sorted() {
        let registry = registry();
        assert_eq!(registry.validator_names(), vec!["identifier", "integer", "non_empty"]);
        assert_eq!(registry.class_names(), vec!["Timestamp"]);
        assert!(registry.contains_initializer("trim"));
        assert!(!registry.contains_validator("trim"));
        assert!(registry.contains_class("Timestamp"));
    }
}
