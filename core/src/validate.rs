//! Validate: match, then either fail with a report or normalize
//!
//! [`validate`] is the throwing counterpart of
//! [`match_structure`](crate::match_structure): a mismatch becomes a
//! [`ValidateError`], a match has its [`Init`](crate::Init) applied to the
//! data, which is returned.

use tracing::debug;

use crate::{match_structure, MatchResult, Schema, SchemaError, ValidateError, Value, INIT_ROOT_PATH};

/// Options for [`validate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Run the root descriptor's init hook. Field-level hooks always run.
    pub init_root: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { init_root: true }
    }
}

impl ValidateOptions {
    /// Skip the root init hook.
    #[must_use]
    pub fn without_root_init() -> Self {
        Self { init_root: false }
    }
}

/// Check `data` against `schema` and return it normalized.
///
/// Composite values are normalized in place: defaults are written into the
/// caller's objects. The root init hook may replace the value entirely, so
/// always use the returned value.
///
/// # Errors
///
/// - [`ValidateError::Argument`] when the value fails with a single message
/// - [`ValidateError::Mismatch`] when one or more fields differ
pub fn validate(data: Value, schema: &Schema) -> Result<Value, ValidateError> {
    validate_with(data, schema, ValidateOptions::default())
}

/// [`validate`] with options.
///
/// # Errors
///
/// Same as [`validate`].
pub fn validate_with(
    data: Value,
    schema: &Schema,
    options: ValidateOptions,
) -> Result<Value, ValidateError> {
    let result = match_structure(&data, schema);
    finish(data, result, options)
}

fn finish(data: Value, result: MatchResult, options: ValidateOptions) -> Result<Value, ValidateError> {
    if let Some(report) = result.report() {
        debug!(count = result.mismatch_count(), "value does not match schema");
        return Err(match report.as_message() {
            Some(message) => ValidateError::Argument(message.to_owned()),
            None => ValidateError::Mismatch(report),
        });
    }
    Ok(match &result.init {
        Some(init) => init.apply_with(data, INIT_ROOT_PATH, options.init_root),
        None => data,
    })
}

/// A schema that passed [`Schema::check`].
///
/// Build once, match many times.
///
/// ```
/// use datashape::prelude::*;
/// use serde_json::json;
///
/// let shape = Shape::new(Primitive::String.into()).unwrap();
/// assert!(shape.match_value(&Value::from(json!("x"))).is_match());
/// assert!(Shape::new(Schema::OneOf(vec![])).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    schema: Schema,
}

impl Shape {
    /// Check and wrap a schema.
    ///
    /// # Errors
    ///
    /// Any error of [`Schema::check`].
    pub fn new(schema: Schema) -> Result<Self, SchemaError> {
        schema.check()?;
        Ok(Self { schema })
    }

    /// The checked schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// See [`match_structure`].
    #[must_use]
    pub fn match_value(&self, value: &Value) -> MatchResult {
        match_structure(value, &self.schema)
    }

    /// See [`validate`].
    ///
    /// # Errors
    ///
    /// Same as [`validate`].
    pub fn validate(&self, data: Value) -> Result<Value, ValidateError> {
        validate(data, &self.schema)
    }

    /// See [`validate_with`].
    ///
    /// # Errors
    ///
    /// Same as [`validate`].
    pub fn validate_with(&self, data: Value, options: ValidateOptions) -> Result<Value, ValidateError> {
        validate_with(data, &self.schema, options)
    }
}
