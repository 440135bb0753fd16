//! Match results: what one matching step found.
//!
//! Every recursive step of [`match_structure`](crate::match_structure)
//! returns a [`MatchResult`]:
//!
//! - [`Structure`]: the shape that was expected at this position (always present)
//! - [`Mismatch`]: why the value does not fit (absent on success)
//! - [`Init`](crate::Init): writes needed before the value is ready (absent when none)
//!
//! # INV: default substitution excludes mismatch
//!
//! A node whose init is [`Init::Default`](crate::Init::Default) never carries a
//! mismatch: the default makes the missing value valid.

use indexmap::IndexMap;

use crate::{Descriptor, Init, InitHook, Report, ValidateHook, Value};

/// Outcome of matching one value against one schema node.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The shape expected at this position.
    pub structure: Structure,
    /// Present only when the value does not match.
    pub mismatch: Option<Mismatch>,
    /// Present only when the value must be written to before use.
    pub init: Option<Init>,
}

impl MatchResult {
    pub(crate) fn matched(structure: Structure) -> Self {
        Self {
            structure,
            mismatch: None,
            init: None,
        }
    }

    pub(crate) fn mismatched(structure: Structure, mismatch: Mismatch) -> Self {
        Self {
            structure,
            mismatch: Some(mismatch),
            init: None,
        }
    }

    /// Returns `true` if the value matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatch.is_none()
    }

    /// Weight of the mismatch, `0` on success.
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.mismatch.as_ref().map_or(0, Mismatch::count)
    }

    /// The mismatch without counts, ready to show to a caller.
    #[must_use]
    pub fn report(&self) -> Option<Report> {
        self.mismatch.as_ref().map(Mismatch::to_report)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Structure
// ═══════════════════════════════════════════════════════════════════════════════

/// The shape a position was matched against.
///
/// Leaf positions carry one type label. A failed alternatives list carries
/// every candidate label. Descriptor positions also carry the descriptor's
/// metadata and, after a field scan, the structure of each scanned field.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Expected type label(s).
    pub types: Vec<String>,
    /// Field name, for declared fields.
    pub name: Option<String>,
    /// Default value, if the descriptor has one.
    pub default: Option<Value>,
    /// Label of the schema unlisted fields must match, if open.
    pub child_type: Option<String>,
    /// The descriptor's validate hook.
    pub validate: Option<ValidateHook>,
    /// The descriptor's init hook.
    pub init: Option<InitHook>,
    /// Structures of the scanned fields, in scan order.
    pub fields: IndexMap<String, Structure>,
}

impl Structure {
    pub(crate) fn leaf(label: impl Into<String>) -> Self {
        Self {
            types: vec![label.into()],
            ..Self::default()
        }
    }

    pub(crate) fn one_of(labels: Vec<String>) -> Self {
        Self {
            types: labels,
            ..Self::default()
        }
    }

    /// Copy the descriptor's non-type attributes.
    pub(crate) fn describe(&mut self, descriptor: &Descriptor) {
        self.name.clone_from(&descriptor.name);
        self.default.clone_from(&descriptor.default);
        self.child_type = descriptor.child_type.as_ref().map(|c| c.label());
        self.validate.clone_from(&descriptor.validate);
        self.init.clone_from(&descriptor.init);
    }

    /// Structure of a scanned field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Structure> {
        self.fields.get(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mismatch
// ═══════════════════════════════════════════════════════════════════════════════

/// Message recorded for fields an object may not have.
pub const FIELD_NOT_ALLOWED: &str = "this field is not allowed";

/// Why a value does not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Leaf failure produced by the matcher (wrong type, no alternative).
    Message(String),
    /// Message returned by a descriptor's validate hook, reported verbatim.
    Rejected(String),
    /// Per-field failures of an object-typed value.
    Fields {
        /// Failure of each offending field, in scan order.
        fields: IndexMap<String, Mismatch>,
        /// Total weight: 1 per leaf failure, nested counts for nested maps.
        count: usize,
    },
}

impl Mismatch {
    /// Weight used to rank alternatives.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Message(_) | Self::Rejected(_) => 1,
            Self::Fields { count, .. } => *count,
        }
    }

    /// Count compared between alternatives.
    ///
    /// Only field maps carry one. A validator message competes for the
    /// closest slot but cannot be compared: it keeps the slot if it claimed
    /// it first and never takes it from a field map.
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        match self {
            Self::Fields { count, .. } => Some(*count),
            Self::Message(_) | Self::Rejected(_) => None,
        }
    }

    /// Whether this mismatch competes when ranking alternatives.
    ///
    /// Plain type failures carry no information about how close the value
    /// came; field maps and validator messages do.
    #[must_use]
    pub fn is_ranked(&self) -> bool {
        !matches!(self, Self::Message(_))
    }

    /// Leaf message, if this is not a field map.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message(m) | Self::Rejected(m) => Some(m),
            Self::Fields { .. } => None,
        }
    }

    /// Failure recorded for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Mismatch> {
        match self {
            Self::Fields { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Strip counts and unwrap validator messages.
    #[must_use]
    pub fn to_report(&self) -> Report {
        match self {
            Self::Message(m) | Self::Rejected(m) => Report::Message(m.clone()),
            Self::Fields { fields, .. } => Report::Fields(
                fields
                    .iter()
                    .map(|(name, mismatch)| (name.clone(), mismatch.to_report()))
                    .collect(),
            ),
        }
    }
}
