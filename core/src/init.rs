//! Init: writes that turn a matched value into its normalized form
//!
//! An [`Init`] is produced by the matcher and applied by
//! [`validate`](crate::validate). It is either a literal default to substitute,
//! or a normalization step: per-field inits applied first, then an optional
//! trailing hook.

use indexmap::IndexMap;
use tracing::debug;

use crate::{InitHook, Value};

/// Instructions for normalizing a value after a successful match.
#[derive(Debug, Clone)]
pub enum Init {
    /// Substitute this value (the position was `Undefined`).
    ///
    /// Applied as a deep copy, so normalized data never aliases the schema.
    Default(Value),
    /// Apply field inits, then run the hook.
    Normalize {
        /// Init for each field, in scan order.
        fields: IndexMap<String, Init>,
        /// Runs after every field init was applied.
        hook: Option<InitHook>,
    },
}

impl Init {
    /// Returns `true` for a default substitution.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }

    /// Init recorded for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Init> {
        match self {
            Self::Normalize { fields, .. } => fields.get(name),
            Self::Default(_) => None,
        }
    }

    /// The trailing hook, if any.
    #[must_use]
    pub fn hook(&self) -> Option<&InitHook> {
        match self {
            Self::Normalize { hook, .. } => hook.as_ref(),
            Self::Default(_) => None,
        }
    }

    /// Apply to `value` at `path`, running every hook.
    #[must_use]
    pub fn apply(&self, value: Value, path: &str) -> Value {
        self.apply_with(value, path, true)
    }

    /// Apply to `value` at `path`. With `run_hook == false` the trailing hook
    /// of this node is skipped; nested hooks still run.
    #[must_use]
    pub fn apply_with(&self, value: Value, path: &str, run_hook: bool) -> Value {
        match self {
            Self::Default(default) => default.deep_clone(),
            Self::Normalize { fields, hook } => {
                for (key, init) in fields {
                    let current = value.get_field(key);
                    let next = init.apply(current, &format!("{path}.{key}"));
                    if !value.set_field(key, next) {
                        debug!(path, field = %key, kind = value.type_tag(), "init target cannot hold fields");
                    }
                }
                match hook {
                    Some(hook) if run_hook => hook.call(value, path),
                    _ => value,
                }
            }
        }
    }

    /// Merge field inits found by a field scan into an existing init.
    pub(crate) fn with_fields(existing: Option<Init>, scanned: IndexMap<String, Init>) -> Init {
        match existing {
            Some(Self::Normalize { mut fields, hook }) => {
                fields.extend(scanned);
                Self::Normalize { fields, hook }
            }
            _ => Self::Normalize {
                fields: scanned,
                hook: None,
            },
        }
    }

    /// Attach a descriptor's hook after whatever is already pending.
    ///
    /// Defaults never reach here: a default substitution returns before hooks
    /// are attached.
    pub(crate) fn with_hook(existing: Option<Init>, next: &InitHook) -> Init {
        match existing {
            Some(Self::Normalize {
                fields,
                hook: Some(inner),
            }) => Self::Normalize {
                fields,
                hook: Some(inner.then(next)),
            },
            Some(Self::Normalize { fields, hook: None }) => Self::Normalize {
                fields,
                hook: Some(next.clone()),
            },
            Some(default @ Self::Default(_)) => default,
            None => Self::Normalize {
                fields: IndexMap::new(),
                hook: Some(next.clone()),
            },
        }
    }
}
