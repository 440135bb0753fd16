//! Registry-based conformance tests
//!
//! Proves that the config-driven path (Path B: `Registry::load_schema()`)
//! produces identical results to the hand-built path (Path A: `Descriptor`
//! builders) on the same inputs.
//!
//! Run with: cargo test -p datashape-test --test registry_conformance --features datashape-test/registry

#![cfg(feature = "registry")]

use datashape::{Registry, RegistryBuilder, SchemaConfig};
use datashape_test::prelude::*;
use serde_json::json;

fn registry() -> Registry {
    datashape_test::register(RegistryBuilder::new()).build()
}

fn load(json: serde_json::Value) -> Schema {
    let config: SchemaConfig = serde_json::from_value(json).expect("config parses");
    registry().load_schema(config).expect("config loads")
}

/// Both paths must agree on match outcome, report, and normalized output.
fn assert_same(manual: &Schema, loaded: &Schema, inputs: &[serde_json::Value]) {
    for input in inputs {
        let a = match_structure(&decode(input.clone()), manual);
        let b = match_structure(&decode(input.clone()), loaded);
        assert_eq!(a.report(), b.report(), "report differs for {input}");
        assert_eq!(a.mismatch_count(), b.mismatch_count(), "count differs for {input}");

        let a = validate(decode(input.clone()), manual).map(|v| v.to_json().unwrap());
        let b = validate(decode(input.clone()), loaded).map(|v| v.to_json().unwrap());
        assert_eq!(a, b, "validate differs for {input}");
    }
}

#[test]
fn person_schema() {
    let manual: Schema = Descriptor::new(Primitive::Object)
        .with_field(Descriptor::field("name", Primitive::String))
        .with_field(Descriptor::field("age", Primitive::Number).with_default(0))
        .with_field(
            Descriptor::field("tags", Primitive::Array)
                .with_child_type(Primitive::String)
                .with_default(json!([])),
        )
        .into();

    let loaded = load(json!({
        "type": "object",
        "fields": [
            { "name": "name", "type": "string" },
            { "name": "age", "type": "number", "default": 0 },
            { "name": "tags", "type": "array", "childType": "string", "default": [] }
        ]
    }));

    assert_same(
        &manual,
        &loaded,
        &[
            json!({ "name": "ann" }),
            json!({ "name": "ann", "age": 3, "tags": ["a"] }),
            json!({ "name": 1, "age": "x" }),
            json!({ "name": "ann", "tags": ["a", 2], "extra": true }),
            json!("not an object"),
        ],
    );
}

#[test]
fn alternatives_schema() {
    let manual: Schema = vec![
        Schema::from(Primitive::String),
        Descriptor::new(Primitive::Object)
            .with_field(Descriptor::field("id", Primitive::Number))
            .into(),
        Descriptor::new(Primitive::Object)
            .with_field(Descriptor::field("name", Primitive::String))
            .with_field(Descriptor::field("email", Primitive::String))
            .into(),
    ]
    .into();

    let loaded = load(json!([
        "string",
        { "type": "object", "fields": [{ "name": "id", "type": "number" }] },
        {
            "type": "object",
            "fields": [
                { "name": "name", "type": "string" },
                { "name": "email", "type": "string" }
            ]
        }
    ]));

    assert_same(
        &manual,
        &loaded,
        &[
            json!("x"),
            json!(42),
            json!({ "id": 1 }),
            json!({ "name": "ann", "email": 1 }),
            json!({ "id": "1", "name": "ann" }),
        ],
    );
}

#[test]
fn class_schema() {
    let manual: Schema = Descriptor::new(Primitive::Object)
        .with_child_type(ClassRef::of::<Timestamp>(Timestamp::CLASS))
        .into();

    let loaded = load(json!({ "type": "object", "childType": "Timestamp" }));

    assert_same(
        &manual,
        &loaded,
        &[
            json!({ "created": { "$class": "Timestamp", "millis": 1 } }),
            json!({ "created": 1 }),
            json!({}),
        ],
    );
}
