//! Matcher: recursive structural comparison of a value against a schema
//!
//! [`match_structure`] walks the schema, descending into a value's fields
//! wherever a descriptor asks for them. It never fails: every outcome is
//! reported in the returned [`MatchResult`].
//!
//! # INV: closest alternative
//!
//! For an alternatives list, the first matching candidate wins. When none
//! matches, the candidate whose mismatch has the lowest count is reported
//! (the earliest one on ties). Plain type failures carry no count; when every
//! candidate failed that way, a message listing the candidate types is
//! synthesized instead.
//!
//! # INV: cycle guard
//!
//! The identity of every object whose fields are being scanned is held in a
//! set owned by the call. A field whose value is in that set is skipped: it
//! neither matches nor mismatches. Entries are removed when the scan of their
//! object ends, so the set is empty when [`match_structure`] returns.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    Descriptor, Init, MatchResult, Mismatch, Schema, Structure, Value, FIELD_NOT_ALLOWED,
    ROOT_PATH,
};

/// Match `value` against `schema`.
///
/// Validate hooks receive paths rooted at [`ROOT_PATH`] (`root.a.b`).
///
/// # Example
///
/// ```
/// use datashape::prelude::*;
/// use serde_json::json;
///
/// let schema: Schema = vec![
///     Schema::from(Primitive::String),
///     Descriptor::new(Primitive::Object)
///         .with_field(Descriptor::field("id", Primitive::Number))
///         .into(),
/// ]
/// .into();
///
/// let result = match_structure(&Value::from(json!(42)), &schema);
/// assert_eq!(
///     result.mismatch,
///     Some(Mismatch::Message("should be one of types: string, object".into()))
/// );
/// ```
#[must_use]
pub fn match_structure(value: &Value, schema: &Schema) -> MatchResult {
    Walker::default().match_schema(value, schema, ROOT_PATH)
}

#[derive(Default)]
struct Walker {
    /// Objects whose fields are currently being scanned.
    visiting: HashSet<usize>,
}

impl Walker {
    fn match_schema(&mut self, value: &Value, schema: &Schema, path: &str) -> MatchResult {
        match schema {
            Schema::Any => MatchResult::matched(Structure::leaf("*")),
            Schema::Primitive(p) => leaf(p.matches(value), p.as_str(), p.type_name()),
            Schema::Class(class) => leaf(class.is_instance(value), class.name(), class.name()),
            Schema::OneOf(candidates) => self.match_one_of(value, candidates, path),
            Schema::Descriptor(descriptor) => self.match_descriptor(value, descriptor, path),
        }
    }

    fn match_descriptor(&mut self, value: &Value, descriptor: &Descriptor, path: &str) -> MatchResult {
        let mut result = self.match_schema(value, &descriptor.ty, path);
        result.structure.describe(descriptor);

        // A default makes a missing value valid, whatever its type says.
        if let Some(default) = &descriptor.default {
            if value.is_undefined() {
                result.mismatch = None;
                result.init = Some(Init::Default(default.clone()));
                return result;
            }
        }

        if result.mismatch.is_none() {
            if let Some(hook) = &descriptor.validate {
                if let Some(message) = hook.call(value, path) {
                    debug!(path, %message, "validate hook rejected value");
                    result.mismatch = Some(Mismatch::Rejected(message));
                }
            }
        }

        if result.mismatch.is_some() || result.init.as_ref().is_some_and(Init::is_default) {
            return result;
        }

        if value.is_object_like() && descriptor.scans_fields() {
            self.scan_fields(value, descriptor, path, &mut result);
        }

        if let Some(hook) = &descriptor.init {
            result.init = Some(Init::with_hook(result.init.take(), hook));
        }
        result
    }

    fn scan_fields(
        &mut self,
        value: &Value,
        descriptor: &Descriptor,
        path: &str,
        result: &mut MatchResult,
    ) {
        let Some(id) = value.identity() else {
            return;
        };
        trace!(path, declared = descriptor.fields.len(), "scanning fields");
        let entered = self.visiting.insert(id);

        let mut scan = FieldScan::default();
        let mut left = value.keys();

        for field in &descriptor.fields {
            let name = field.name.as_deref().unwrap_or_default();
            left.retain(|key| key != name);

            let field_value = value.get_field(name);
            if self.is_visiting(&field_value, path, name) {
                continue;
            }
            let child = self.match_descriptor(&field_value, field, &format!("{path}.{name}"));
            scan.record(name, child);
        }

        for name in left {
            let Some(child_type) = &descriptor.child_type else {
                scan.reject(&name);
                continue;
            };
            let field_value = value.get_field(&name);
            if self.is_visiting(&field_value, path, &name) {
                continue;
            }
            let child = self.match_schema(&field_value, child_type, &format!("{path}.{name}"));
            scan.record(&name, child);
        }

        if entered {
            self.visiting.remove(&id);
        }
        scan.finish(result);
    }

    fn is_visiting(&self, value: &Value, path: &str, name: &str) -> bool {
        let cyclic = value
            .identity()
            .is_some_and(|id| self.visiting.contains(&id));
        if cyclic {
            trace!(path, field = name, "skipping field that refers back to an object being scanned");
        }
        cyclic
    }

    fn match_one_of(&mut self, value: &Value, candidates: &[Schema], path: &str) -> MatchResult {
        let mut closest: Option<MatchResult> = None;

        for candidate in candidates {
            let result = self.match_schema(value, candidate, path);
            let Some(mismatch) = &result.mismatch else {
                return result;
            };
            if !mismatch.is_ranked() {
                continue;
            }
            let rank = mismatch.rank();
            let best = closest
                .as_ref()
                .map(|best| best.mismatch.as_ref().and_then(Mismatch::rank));
            let closer = match best {
                None => true,
                Some(best) => matches!((rank, best), (Some(new), Some(old)) if new < old),
            };
            if closer {
                trace!(path, candidate = %candidate.label(), ?rank, "closest candidate so far");
                closest = Some(result);
            }
        }

        if let Some(best) = closest {
            return best;
        }

        let mut labels: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let label = candidate.label();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        let message = match labels.as_slice() {
            [] => "no type is accepted here".to_owned(),
            [single] => format!("should be of type {single}"),
            many => format!("should be one of types: {}", many.join(", ")),
        };
        debug!(path, %message, "no alternative matched");
        MatchResult::mismatched(Structure::one_of(labels), Mismatch::Message(message))
    }
}

fn leaf(matched: bool, label: &str, type_name: &str) -> MatchResult {
    let structure = Structure::leaf(label);
    if matched {
        MatchResult::matched(structure)
    } else {
        MatchResult::mismatched(
            structure,
            Mismatch::Message(format!("should be of type {type_name}")),
        )
    }
}

/// Accumulates per-field outcomes of one field scan.
#[derive(Default)]
struct FieldScan {
    structures: IndexMap<String, Structure>,
    mismatches: IndexMap<String, Mismatch>,
    count: usize,
    inits: IndexMap<String, Init>,
}

impl FieldScan {
    fn record(&mut self, name: &str, child: MatchResult) {
        if let Some(mismatch) = child.mismatch {
            self.count += mismatch.count();
            self.mismatches.insert(name.to_owned(), mismatch);
        }
        if let Some(init) = child.init {
            self.inits.insert(name.to_owned(), init);
        }
        self.structures.insert(name.to_owned(), child.structure);
    }

    fn reject(&mut self, name: &str) {
        self.mismatches
            .insert(name.to_owned(), Mismatch::Message(FIELD_NOT_ALLOWED.to_owned()));
        self.count += 1;
    }

    fn finish(self, result: &mut MatchResult) {
        result.structure.fields.extend(self.structures);
        if self.count > 0 {
            result.mismatch = Some(Mismatch::Fields {
                fields: self.mismatches,
                count: self.count,
            });
        }
        if !self.inits.is_empty() {
            result.init = Some(Init::with_fields(result.init.take(), self.inits));
        }
    }
}
