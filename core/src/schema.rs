//! Schema: declarative description of accepted value shapes
//!
//! A [`Schema`] is one of:
//!
//! - [`Schema::Any`]: the wildcard `"*"`
//! - [`Schema::Primitive`]: a runtime type tag (`string`, `number`, ...)
//! - [`Schema::Class`]: instances of a named class ([`ClassRef`])
//! - [`Schema::OneOf`]: ordered alternatives, the value must match one
//! - [`Schema::Descriptor`]: a type plus fields, defaults and hooks
//!
//! Schemas are immutable once built; the matcher only reads them.

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::{SchemaError, Value, MAX_DEPTH};

// ═══════════════════════════════════════════════════════════════════════════════
// Primitive
// ═══════════════════════════════════════════════════════════════════════════════

/// A primitive kind, compared against [`Value::type_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"boolean"`
    Boolean,
    /// `"object"`: objects, arrays and class instances.
    Object,
    /// `"array"`: arrays only.
    Array,
    /// `"undefined"`
    Undefined,
    /// `"null"`
    Null,
}

impl Primitive {
    /// Parse a primitive name, case-insensitively.
    ///
    /// ```
    /// use datashape::Primitive;
    ///
    /// assert_eq!(Primitive::parse("Number"), Some(Primitive::Number));
    /// assert_eq!(Primitive::parse("date"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "undefined" => Some(Self::Undefined),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// The lower-case name of this primitive.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Undefined => "undefined",
            Self::Null => "null",
        }
    }

    /// Name used in "should be of type" messages.
    ///
    /// Arrays are reported by their class name, `Array`.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Array => "Array",
            other => other.as_str(),
        }
    }

    /// Returns `true` if `value` has this primitive kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Array => value.is_array(),
            other => value.type_tag() == other.as_str(),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ClassRef
// ═══════════════════════════════════════════════════════════════════════════════

type InstanceCheck = dyn Fn(&Value) -> bool + Send + Sync;

/// A named class whose instances are accepted.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use datashape::{ClassRef, CustomValue, Value};
///
/// #[derive(Debug)]
/// struct Uuid(u128);
///
/// impl CustomValue for Uuid {
///     fn class_name(&self) -> &'static str { "Uuid" }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let class = ClassRef::of::<Uuid>("Uuid");
/// assert!(class.is_instance(&Value::Custom(Arc::new(Uuid(7)))));
/// assert!(!class.is_instance(&Value::from("7")));
/// ```
#[derive(Clone)]
pub struct ClassRef {
    name: String,
    check: Arc<InstanceCheck>,
}

impl ClassRef {
    /// A class with a custom instance-of check.
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Instances of the concrete type `T`.
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self::new(name, |value| {
            value
                .as_custom()
                .is_some_and(|custom| custom.as_any().is::<T>())
        })
    }

    /// Any custom value answering `true` to
    /// [`is_instance_of(name)`](crate::CustomValue::is_instance_of).
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let class = name.clone();
        Self::new(name, move |value| {
            value
                .as_custom()
                .is_some_and(|custom| custom.is_instance_of(&class))
        })
    }

    /// The class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance-of check.
    #[must_use]
    pub fn is_instance(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassRef").field(&self.name).finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hooks
// ═══════════════════════════════════════════════════════════════════════════════

type ValidateFn = dyn Fn(&Value, &str) -> Option<String> + Send + Sync;
type InitFn = dyn Fn(Value, &str) -> Value + Send + Sync;

/// Custom validation run after a value matched structurally.
///
/// Receives the value and its path (`root.a.b`); returns a message to
/// reject the value. An empty message counts as acceptance.
#[derive(Clone)]
pub struct ValidateHook {
    label: Option<String>,
    f: Arc<ValidateFn>,
}

impl ValidateHook {
    /// Wrap a validation function.
    pub fn new(f: impl Fn(&Value, &str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            label: None,
            f: Arc::new(f),
        }
    }

    /// Attach a label, shown in `Debug` output.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Run the hook. `None` means the value is accepted.
    #[must_use]
    pub fn call(&self, value: &Value, path: &str) -> Option<String> {
        (self.f)(value, path).filter(|message| !message.is_empty())
    }
}

impl Debug for ValidateHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "ValidateHook({label})"),
            None => f.write_str("ValidateHook(..)"),
        }
    }
}

/// Normalization run after a successful match.
///
/// Receives the value (with field defaults already merged in) and its path
/// (`self.a.b`); returns the normalized value.
#[derive(Clone)]
pub struct InitHook {
    label: Option<String>,
    f: Arc<InitFn>,
}

impl InitHook {
    /// Wrap a normalization function.
    pub fn new(f: impl Fn(Value, &str) -> Value + Send + Sync + 'static) -> Self {
        Self {
            label: None,
            f: Arc::new(f),
        }
    }

    /// Attach a label, shown in `Debug` output.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Run the hook.
    #[must_use]
    pub fn call(&self, value: Value, path: &str) -> Value {
        (self.f)(value, path)
    }

    /// Compose: run `self`, then `next` on its output.
    #[must_use]
    pub fn then(&self, next: &InitHook) -> InitHook {
        let first = Arc::clone(&self.f);
        let second = Arc::clone(&next.f);
        let label = match (&self.label, &next.label) {
            (Some(a), Some(b)) => Some(format!("{a} -> {b}")),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        InitHook {
            label,
            f: Arc::new(move |value, path| second(first(value, path), path)),
        }
    }
}

impl Debug for InitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "InitHook({label})"),
            None => f.write_str("InitHook(..)"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Descriptor
// ═══════════════════════════════════════════════════════════════════════════════

/// A schema node carrying metadata beyond a bare type.
///
/// # Example
///
/// ```
/// use datashape::{Descriptor, Primitive};
///
/// let person = Descriptor::new(Primitive::Object)
///     .with_field(Descriptor::field("name", Primitive::String))
///     .with_field(Descriptor::field("age", Primitive::Number).with_default(0));
///
/// assert_eq!(person.fields.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// The type the value must have.
    pub ty: Schema,
    /// Field name, when this descriptor is an entry of a parent's `fields`.
    pub name: Option<String>,
    /// Declared fields, scanned in order.
    pub fields: Vec<Descriptor>,
    /// Schema for every field not listed in `fields`. `None` rejects them.
    pub child_type: Option<Schema>,
    /// Substituted when the value is `Undefined`.
    pub default: Option<Value>,
    /// Runs after a successful structural match.
    pub validate: Option<ValidateHook>,
    /// Runs after defaults are merged in, on successful match.
    pub init: Option<InitHook>,
}

impl Descriptor {
    /// A descriptor of the given type with no metadata.
    pub fn new(ty: impl Into<Schema>) -> Self {
        Self {
            ty: ty.into(),
            name: None,
            fields: Vec::new(),
            child_type: None,
            default: None,
            validate: None,
            init: None,
        }
    }

    /// A named field descriptor.
    pub fn field(name: impl Into<String>, ty: impl Into<Schema>) -> Self {
        Self::new(ty).named(name)
    }

    /// Set the field name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a field.
    #[must_use]
    pub fn with_field(mut self, field: Descriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare several fields.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Descriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Accept unlisted fields of the given type.
    #[must_use]
    pub fn with_child_type(mut self, ty: impl Into<Schema>) -> Self {
        self.child_type = Some(ty.into());
        self
    }

    /// Value to substitute when the value is `Undefined`.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Custom validation.
    #[must_use]
    pub fn with_validate(
        mut self,
        f: impl Fn(&Value, &str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(ValidateHook::new(f));
        self
    }

    /// Custom validation from an existing hook.
    #[must_use]
    pub fn with_validate_hook(mut self, hook: ValidateHook) -> Self {
        self.validate = Some(hook);
        self
    }

    /// Post-match normalization.
    #[must_use]
    pub fn with_init(mut self, f: impl Fn(Value, &str) -> Value + Send + Sync + 'static) -> Self {
        self.init = Some(InitHook::new(f));
        self
    }

    /// Post-match normalization from an existing hook.
    #[must_use]
    pub fn with_init_hook(mut self, hook: InitHook) -> Self {
        self.init = Some(hook);
        self
    }

    /// Whether a field scan may run under this descriptor's type.
    ///
    /// Only primitive names, the wildcard and nested descriptors open up an
    /// object's fields; class references and alternatives do not.
    pub(crate) fn scans_fields(&self) -> bool {
        matches!(
            self.ty,
            Schema::Any | Schema::Primitive(_) | Schema::Descriptor(_)
        )
    }

    fn depth(&self) -> usize {
        let ty = self.ty.depth();
        let fields = self.fields.iter().map(Descriptor::depth).max().unwrap_or(0);
        let child = self.child_type.as_ref().map_or(0, Schema::depth);
        1 + ty.max(fields).max(child)
    }

    fn check_at(&self, path: &str) -> Result<(), SchemaError> {
        self.ty.check_at(path)?;
        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            let Some(name) = field.name.as_deref() else {
                return Err(SchemaError::UnnamedField {
                    path: path.to_owned(),
                    index,
                });
            };
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateField {
                    path: path.to_owned(),
                    name: name.to_owned(),
                });
            }
            field.check_at(&format!("{path}.{name}"))?;
        }
        match &self.child_type {
            Some(child) => child.check_at(&format!("{path}.*")),
            None => Ok(()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Schema
// ═══════════════════════════════════════════════════════════════════════════════

/// One accepted shape at one position.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Accepts anything (`"*"`).
    Any,
    /// A primitive kind.
    Primitive(Primitive),
    /// Instances of a class.
    Class(ClassRef),
    /// Ordered alternatives; the first match wins.
    OneOf(Vec<Schema>),
    /// Type plus fields, default and hooks.
    Descriptor(Box<Descriptor>),
}

impl Schema {
    /// Parse a type name: `"*"` or a primitive name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownType`] for any other name. Class names
    /// are resolved through the registry instead.
    pub fn named(name: &str) -> Result<Self, SchemaError> {
        if name == "*" {
            return Ok(Self::Any);
        }
        Primitive::parse(name)
            .map(Self::Primitive)
            .ok_or_else(|| SchemaError::UnknownType {
                name: name.to_owned(),
                available: Vec::new(),
            })
    }

    /// Label used when listing candidate types.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Any => "*".to_owned(),
            Self::Primitive(p) => p.as_str().to_owned(),
            Self::Class(c) => c.name().to_owned(),
            Self::OneOf(candidates) => candidates
                .iter()
                .map(Schema::label)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Descriptor(d) => d.ty.label(),
        }
    }

    /// Nesting depth (a leaf is 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Any | Self::Primitive(_) | Self::Class(_) => 1,
            Self::OneOf(candidates) => 1 + candidates.iter().map(Schema::depth).max().unwrap_or(0),
            Self::Descriptor(d) => d.depth(),
        }
    }

    /// Check structural sanity of this schema.
    ///
    /// Run once at construction time (see [`Shape::new`](crate::Shape::new));
    /// matching itself never fails.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::DepthExceeded`]: nesting deeper than [`MAX_DEPTH`]
    /// - [`SchemaError::EmptyAlternatives`]: an alternatives list with no candidates
    /// - [`SchemaError::UnnamedField`]: a declared field without a name
    /// - [`SchemaError::DuplicateField`]: two declared fields with the same name
    pub fn check(&self) -> Result<(), SchemaError> {
        let depth = self.depth();
        if depth > MAX_DEPTH {
            return Err(SchemaError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }
        self.check_at("root")
    }

    fn check_at(&self, path: &str) -> Result<(), SchemaError> {
        match self {
            Self::Any | Self::Primitive(_) | Self::Class(_) => Ok(()),
            Self::OneOf(candidates) => {
                if candidates.is_empty() {
                    return Err(SchemaError::EmptyAlternatives {
                        path: path.to_owned(),
                    });
                }
                candidates.iter().try_for_each(|c| c.check_at(path))
            }
            Self::Descriptor(d) => d.check_at(path),
        }
    }
}

impl From<Primitive> for Schema {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<ClassRef> for Schema {
    fn from(c: ClassRef) -> Self {
        Self::Class(c)
    }
}

impl From<Descriptor> for Schema {
    fn from(d: Descriptor) -> Self {
        Self::Descriptor(Box::new(d))
    }
}

impl From<Vec<Schema>> for Schema {
    fn from(candidates: Vec<Schema>) -> Self {
        Self::OneOf(candidates)
    }
}
