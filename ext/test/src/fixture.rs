//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them through the config loading path:
//! YAML → `SchemaConfig` → `Registry::load_shape()` → `validate`.
//!
//! ```yaml
//! name: missing field gets default
//! schema:
//!   type: object
//!   fields:
//!     - { name: age, type: number, default: 0 }
//! cases:
//!   - name: empty object
//!     input: {}
//!     expect: { age: 0 }
//!   - name: wrong type
//!     input: { age: "x" }
//!     error: { age: "should be of type number" }
//! ```
//!
//! A case without `input` validates `undefined`. A case with `error` must fail
//! with exactly that report; otherwise it must succeed, and produce `expect`
//! when given. Fixtures with `expect_error: true` must fail to load.

use datashape::prelude::*;
use datashape::{Registry, SchemaConfig};
use serde::{Deserialize, Deserializer};

use crate::decode;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub expect_error: bool,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub input: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default = "default_init_root")]
    pub init_root: bool,
}

fn default_init_root() -> bool {
    true
}

// `input: null` is null, a missing `input` is undefined.
fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl TestCase {
    /// Build the value under test.
    pub fn build_value(&self) -> Value {
        self.input.clone().map_or(Value::Undefined, decode)
    }

    fn options(&self) -> ValidateOptions {
        ValidateOptions {
            init_root: self.init_root,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Parse and load the schema.
    pub fn load(&self, registry: &Registry) -> Result<Shape, SchemaError> {
        let config: SchemaConfig =
            serde_json::from_value(self.schema.clone()).map_err(|e| SchemaError::InvalidConfig {
                reason: e.to_string(),
            })?;
        registry.load_shape(config)
    }

    /// Run all test cases and return results
    pub fn run(&self, registry: &Registry) -> Vec<CaseResult> {
        let shape = match self.load(registry) {
            Ok(shape) => shape,
            Err(e) => {
                return vec![CaseResult {
                    case_name: "<load>".to_owned(),
                    passed: false,
                    expected: "schema loads".to_owned(),
                    actual: e.to_string(),
                }]
            }
        };
        self.cases.iter().map(|case| run_case(&shape, case)).collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self, registry: &Registry) {
        if self.expect_error {
            let result = self.load(registry);
            assert!(
                result.is_err(),
                "Fixture '{}' expected a load error but the schema loaded",
                self.name
            );
            return;
        }
        for result in self.run(registry) {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

fn run_case(shape: &Shape, case: &TestCase) -> CaseResult {
    let outcome = shape.validate_with(case.build_value(), case.options());

    let (passed, expected, actual) = match (&case.error, outcome) {
        (Some(expected), Err(err)) => {
            let actual = err.report().to_json();
            (actual == *expected, expected.to_string(), actual.to_string())
        }
        (Some(expected), Ok(value)) => (
            false,
            format!("error {expected}"),
            format!("success {}", render(&value)),
        ),
        (None, Ok(value)) => {
            let actual = render(&value);
            match &case.expect {
                Some(expected) => (actual == expected.to_string(), expected.to_string(), actual),
                None => (true, "success".to_owned(), actual),
            }
        }
        (None, Err(err)) => (false, "success".to_owned(), err.to_string()),
    };

    CaseResult {
        case_name: case.name.clone(),
        passed,
        expected,
        actual,
    }
}

fn render(value: &Value) -> String {
    value
        .to_json()
        .map_or_else(|e| format!("<{e}>"), |json| json.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: age default
schema:
  type: object
  fields:
    - { name: age, type: number, default: 0 }
cases:
  - name: empty object
    input: {}
    expect: { age: 0 }
  - name: wrong type
    input: { age: "x" }
    error: { age: "should be of type number" }
  - name: undefined input
    error: "should be of type object"
"#;

    fn registry() -> Registry {
        crate::register(datashape::RegistryBuilder::new()).build()
    }

    #[test]
    fn parse_fixture() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.cases.len(), 3);
        assert!(fixture.cases[2].input.is_none());
        assert!(fixture.cases[0].init_root);
    }

    #[test]
    fn run_fixture() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        let results = fixture.run(&registry());
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn failing_case_is_reported() {
        let mut fixture = Fixture::from_yaml(FIXTURE).unwrap();
        fixture.cases[0].expect = Some(serde_json::json!({ "age": 1 }));
        let results = fixture.run(&registry());
        assert!(!results[0].passed);
        assert_eq!(results[0].actual, r#"{"age":0}"#);
    }
}
