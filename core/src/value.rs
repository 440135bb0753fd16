//! `Value`: the in-memory data a [`Schema`](crate::Schema) is matched against
//!
//! Scalars are stored inline. Objects and arrays are shared handles
//! (`Arc<RwLock<..>>`) with identity, which is what makes self-referential
//! graphs expressible and lets initialization write through to the caller's
//! data.
//!
//! # Extensibility via `Custom`
//!
//! Instances of domain types ("classes") implement [`CustomValue`] and are
//! wrapped as `Value::Custom(Arc::new(your_type))`. A
//! [`ClassRef`](crate::ClassRef) matches them by instance-of check.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::{ValueError, MAX_ARRAY_PADDING};

/// Extension trait for class instances carried by [`Value::Custom`].
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use datashape::{CustomValue, Value};
///
/// #[derive(Debug)]
/// struct Timestamp(i64);
///
/// impl CustomValue for Timestamp {
///     fn class_name(&self) -> &'static str {
///         "Timestamp"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let value = Value::Custom(Arc::new(Timestamp(0)));
/// assert_eq!(value.type_tag(), "object");
/// ```
pub trait CustomValue: Send + Sync + Debug {
    /// Name of the class this value is an instance of.
    fn class_name(&self) -> &'static str;

    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Instance-of check by class name.
    ///
    /// Override to model inheritance: a subclass answers `true` for its
    /// parents' names too.
    fn is_instance_of(&self, class: &str) -> bool {
        self.class_name() == class
    }

    /// JSON rendering of this instance. Defaults to an empty object.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Object
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared, insertion-ordered map of fields.
///
/// Cloning an `Object` clones the handle, not the contents. Use
/// [`Value::deep_clone`] for a detached copy.
#[derive(Clone, Default)]
pub struct Object(Arc<RwLock<IndexMap<String, Value>>>);

impl Object {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field (builder pattern).
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Value>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Value>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a field, `Undefined` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.read().get(key).cloned().unwrap_or_default()
    }

    /// Returns `true` if the field is present (even if `Undefined`).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.write().insert(key.into(), value.into())
    }

    /// Remove a field, preserving the order of the others.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().shift_remove(key)
    }

    /// Field names in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of all fields in insertion order.
    ///
    /// The lock is released before returning, so callers may recurse into
    /// the values (including back into this object).
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

// Shallow: a field may point back at this object.
impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("keys", &self.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(Arc::new(RwLock::new(map)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Array
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared, growable list of values. Cloning clones the handle.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Value>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get an element, `Undefined` when out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.read().get(index).cloned().unwrap_or_default()
    }

    /// Set an element, padding with `Undefined` when `index` is past the end.
    ///
    /// Returns `false`, leaving the array untouched, when `index` lies more
    /// than [`MAX_ARRAY_PADDING`] slots past the end.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        let mut items = self.write();
        if index < items.len() {
            items[index] = value.into();
            return true;
        }
        if index - items.len() > MAX_ARRAY_PADDING {
            return false;
        }
        items.resize(index, Value::Undefined);
        items.push(value.into());
        true
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) {
        self.write().push(value.into());
    }

    /// Snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.read().clone()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns `true` if both handles point at the same array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array").field("len", &self.len()).finish()
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let items = iter.into_iter().map(Into::into).collect();
        Self(Arc::new(RwLock::new(items)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Value
// ═══════════════════════════════════════════════════════════════════════════════

/// A dynamically-typed value.
///
/// # Variants
///
/// - `Undefined`: absent (a missing field reads as `Undefined`)
/// - `Null`, `Bool`, `Number`, `String`: scalars
/// - `Array`, `Object`: shared composite handles
/// - `Custom`: class instances implementing [`CustomValue`]
///
/// Equality on composites is identity: two `Object`s are equal only if they
/// are the same object. Compare [`to_json`](Self::to_json) output for
/// structural equality.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (double precision).
    Number(f64),
    /// String.
    String(String),
    /// Array handle.
    Array(Array),
    /// Object handle.
    Object(Object),
    /// Class instance.
    Custom(Arc<dyn CustomValue>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Build an object value from `(key, value)` pairs.
    pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(fields.into_iter().collect())
    }

    /// Build an array value.
    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Returns `true` if this is `Undefined`.
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Runtime type tag.
    ///
    /// Objects, arrays, and class instances all report `"object"`; use
    /// [`is_array`](Self::is_array) to tell arrays apart.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) | Self::Object(_) | Self::Custom(_) => "object",
        }
    }

    /// Returns `true` for objects, arrays, and class instances.
    #[inline]
    #[must_use]
    pub fn is_object_like(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_) | Self::Custom(_))
    }

    /// Returns `true` if this is an array.
    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Try to get the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the object handle.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Try to get the array handle.
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get the class instance.
    #[must_use]
    pub fn as_custom(&self) -> Option<&dyn CustomValue> {
        match self {
            Self::Custom(c) => Some(&**c),
            _ => None,
        }
    }

    /// Identity of a composite value, `None` for scalars.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::Object(o) => Some(o.id()),
            Self::Array(a) => Some(a.id()),
            Self::Custom(c) => Some(Arc::as_ptr(c).cast::<()>() as usize),
            _ => None,
        }
    }

    /// Own field names: object keys in insertion order, array indices, or
    /// nothing for every other value.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Object(o) => o.keys(),
            Self::Array(a) => (0..a.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Read a field by name (array elements by decimal index).
    #[must_use]
    pub fn get_field(&self, key: &str) -> Value {
        match self {
            Self::Object(o) => o.get(key),
            Self::Array(a) => key
                .parse::<usize>()
                .map_or(Value::Undefined, |index| a.get(index)),
            _ => Value::Undefined,
        }
    }

    /// Write a field by name (array elements by decimal index).
    ///
    /// Returns `false` if this value cannot hold fields, or if the key is an
    /// array index too far past the end (see [`Array::set`]).
    pub fn set_field(&self, key: &str, value: Value) -> bool {
        match self {
            Self::Object(o) => {
                o.insert(key, value);
                true
            }
            Self::Array(a) => match key.parse::<usize>() {
                Ok(index) => a.set(index, value),
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Detached recursive copy. Shared and cyclic references inside the
    /// graph are preserved in the copy; class instances stay shared.
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        self.deep_clone_with(&mut HashMap::new())
    }

    fn deep_clone_with(&self, copies: &mut HashMap<usize, Value>) -> Value {
        match self {
            Self::Object(obj) => {
                if let Some(copy) = copies.get(&obj.id()) {
                    return copy.clone();
                }
                let copy = Object::new();
                copies.insert(obj.id(), Self::Object(copy.clone()));
                for (key, value) in obj.entries() {
                    copy.insert(key, value.deep_clone_with(copies));
                }
                Self::Object(copy)
            }
            Self::Array(arr) => {
                if let Some(copy) = copies.get(&arr.id()) {
                    return copy.clone();
                }
                let copy = Array::new();
                copies.insert(arr.id(), Self::Array(copy.clone()));
                for value in arr.to_vec() {
                    copy.push(value.deep_clone_with(copies));
                }
                Self::Array(copy)
            }
            other => other.clone(),
        }
    }

    /// Convert to JSON.
    ///
    /// `Undefined` object fields are omitted and `Undefined` array slots
    /// become `null`. Integral numbers are emitted as JSON integers.
    ///
    /// # Errors
    ///
    /// - [`ValueError::Cycle`] if the graph is self-referential
    /// - [`ValueError::NonFinite`] for NaN or infinite numbers
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        self.to_json_with(&mut HashSet::new())
    }

    fn to_json_with(&self, stack: &mut HashSet<usize>) -> Result<serde_json::Value, ValueError> {
        use serde_json::Value as Json;

        match self {
            Self::Undefined | Self::Null => Ok(Json::Null),
            Self::Bool(b) => Ok(Json::Bool(*b)),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => Ok(Json::String(s.clone())),
            Self::Array(arr) => {
                if !stack.insert(arr.id()) {
                    return Err(ValueError::Cycle);
                }
                let items = arr
                    .to_vec()
                    .iter()
                    .map(|v| v.to_json_with(stack))
                    .collect::<Result<Vec<_>, _>>();
                stack.remove(&arr.id());
                Ok(Json::Array(items?))
            }
            Self::Object(obj) => {
                if !stack.insert(obj.id()) {
                    return Err(ValueError::Cycle);
                }
                let mut map = serde_json::Map::new();
                let mut failed = None;
                for (key, value) in obj.entries() {
                    if value.is_undefined() {
                        continue;
                    }
                    match value.to_json_with(stack) {
                        Ok(json) => {
                            map.insert(key, json);
                        }
                        Err(e) => {
                            failed = Some(e);
                            break;
                        }
                    }
                }
                stack.remove(&obj.id());
                match failed {
                    Some(e) => Err(e),
                    None => Ok(Json::Object(map)),
                }
            }
            Self::Custom(c) => Ok(c.to_json()),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_to_json(n: f64) -> Result<serde_json::Value, ValueError> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if !n.is_finite() {
        return Err(ValueError::NonFinite(n));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .ok_or(ValueError::NonFinite(n))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════════════

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::array(items)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Undefined, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::array(items.into_iter().map(Value::from)),
            Json::Object(map) => Self::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}
