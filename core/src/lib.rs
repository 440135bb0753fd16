//! datashape - declarative structural type matching
//!
//! Checks an in-memory [`Value`] against a [`Schema`] describing the shapes it
//! may take. On mismatch, reports the *closest* alternative with a field-keyed
//! description of what differs. On success, applies defaults and runs init
//! hooks to bring the value into its normalized form.
//!
//! # Architecture
//!
//! - [`Value`]: the data being checked (shared composite handles with identity)
//! - [`Schema`]: accepted shapes: primitives, classes, alternatives, descriptors
//! - [`match_structure`]: the recursive matcher; returns a [`MatchResult`]
//! - [`MatchResult`]: expected [`Structure`], optional [`Mismatch`], optional [`Init`]
//! - [`validate`]: applies the init on success, a [`ValidateError`] otherwise
//!
//! # Key Design Insights
//!
//! 1. **Matching never fails.** [`match_structure`] is total: every outcome is
//!    data. Only [`validate`] turns a mismatch into an error.
//!
//! 2. **Closest alternative.** Each mismatch carries a weight. When none of an
//!    alternatives list matches, the candidate with the lowest weight is
//!    reported, so the diff shows the shape the caller most likely meant.
//!
//! 3. **Cycle-safe.** Objects being scanned are tracked by identity for the
//!    duration of one call. A field pointing back at one of them is skipped.
//!    The caller's data is never marked.
//!
//! # Example
//!
//! ```
//! use datashape::prelude::*;
//! use serde_json::json;
//!
//! let schema: Schema = Descriptor::new(Primitive::Object)
//!     .with_field(Descriptor::field("age", Primitive::Number).with_default(0))
//!     .into();
//!
//! let data = Value::from(json!({}));
//! let normalized = validate(data, &schema).unwrap();
//! assert_eq!(normalized.to_json().unwrap(), json!({ "age": 0 }));
//!
//! let err = validate(Value::from(json!({ "age": "x" })), &schema).unwrap_err();
//! assert!(err.to_string().contains("age: \"should be of type number\""));
//! ```
//!
//! # Extensions
//!
//! - [`Registry`]: load schemas from JSON/YAML config (feature = `"registry"`)
//! - `datashape-test`: conformance fixtures (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod init;
mod matcher;
mod report;
mod result;
mod schema;
mod validate;
mod value;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use init::Init;
pub use matcher::match_structure;
pub use report::Report;
pub use result::{MatchResult, Mismatch, Structure, FIELD_NOT_ALLOWED};
pub use schema::{ClassRef, Descriptor, InitHook, Primitive, Schema, ValidateHook};
pub use validate::{validate, validate_with, Shape, ValidateOptions};
pub use value::{Array, CustomValue, Object, Value};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{DescriptorConfig, SchemaConfig};
#[cfg(feature = "registry")]
pub use registry::{register_builtin_hooks, Registry, RegistryBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use datashape::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Entry points
        match_structure,
        validate,
        validate_with,
        // Schema model
        ClassRef,
        // Values
        CustomValue,
        Descriptor,
        // Results
        Init,
        InitHook,
        MatchResult,
        Mismatch,
        Object,
        Primitive,
        Report,
        Schema,
        // Errors
        SchemaError,
        Shape,
        Structure,
        ValidateError,
        ValidateHook,
        ValidateOptions,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed schema nesting depth.
///
/// Matching recurses once per schema level, so this bounds stack use.
/// Checked at construction time via [`Schema::check`].
pub const MAX_DEPTH: usize = 64;

/// How far past its end an array may be grown by a single field write.
///
/// Writes further out are refused, so a numeric field name cannot force an
/// unbounded allocation.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Path passed to validate hooks for the value at the top of a match.
pub const ROOT_PATH: &str = "root";

/// Path passed to init hooks for the value at the top of a validate call.
pub const INIT_ROOT_PATH: &str = "self";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from schema construction and config loading.
///
/// These are caught before any value is matched. Fix the schema and build it
/// again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Schema nesting exceeds [`MAX_DEPTH`].
    #[error("schema nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Actual depth of the schema.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },
    /// An alternatives list has no candidates, so nothing could match.
    #[error("alternatives at {path} are empty")]
    EmptyAlternatives {
        /// Position of the list.
        path: String,
    },
    /// A declared field has no name.
    #[error("field #{index} of {path} has no name")]
    UnnamedField {
        /// Position of the owning descriptor.
        path: String,
        /// Index in the `fields` list.
        index: usize,
    },
    /// Two declared fields share a name.
    #[error("field \"{name}\" is declared twice in {path}")]
    DuplicateField {
        /// Position of the owning descriptor.
        path: String,
        /// The repeated name.
        name: String,
    },
    /// A type name is neither a primitive nor a registered class.
    #[error("unknown type \"{name}\"{}", registered(.available))]
    UnknownType {
        /// The unresolved name.
        name: String,
        /// Class names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
    /// A hook name was not found in the registry.
    #[error("unknown {kind} hook \"{name}\"{}", registered(.available))]
    UnknownHook {
        /// Which hook table was searched (`"validate"` or `"init"`).
        kind: &'static str,
        /// The unresolved name.
        name: String,
        /// Hook names that ARE registered.
        available: Vec<String>,
    },
    /// Configuration deserialization failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
}

fn registered(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!("; registered: {}", available.join(", "))
    }
}

/// Failure of [`validate`].
///
/// The `Display` output is a stable diagnostic format. Inspect
/// [`report`](Self::report) or use [`match_structure`] for structured data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidateError {
    /// The value failed at the top level with a single message.
    #[error("argument {0}")]
    Argument(String),
    /// One or more fields differ from the closest accepted structure.
    #[error(
        "the given data doesn't match the required type, difference with the most similar structure:\n{0}"
    )]
    Mismatch(Report),
}

impl ValidateError {
    /// The mismatch, as reported.
    #[must_use]
    pub fn report(&self) -> Report {
        match self {
            Self::Argument(message) => Report::Message(message.clone()),
            Self::Mismatch(report) => report.clone(),
        }
    }
}

/// Errors converting a [`Value`] to JSON.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The value graph refers back to itself.
    #[error("value contains a reference cycle")]
    Cycle,
    /// JSON has no representation for NaN or infinity.
    #[error("number {0} has no JSON representation")]
    NonFinite(f64),
}
