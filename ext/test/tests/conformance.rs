//! Conformance tests that run YAML fixtures against datashape
//!
//! Run with: cargo test -p datashape-test --test conformance --features datashape-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use datashape::RegistryBuilder;
use datashape_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the conformance directory relative to the workspace root
fn fixtures_dir() -> PathBuf {
    // The manifest dir is ext/test, we need to go up to the workspace root
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent() // ext
        .and_then(|p| p.parent()) // workspace root
        .expect("Could not find workspace root")
        .join("conformance")
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    assert!(
        dir.exists(),
        "Fixtures directory does not exist: {}",
        dir.display()
    );

    let registry = datashape_test::register(RegistryBuilder::new()).build();

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| {
            path.extension()
                .is_some_and(|e| e == "yaml" || e == "yml")
        })
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());

    for path in paths {
        println!("Running fixture: {}", path.display());

        let yaml = fs::read_to_string(&path).expect("read yaml");

        // Parse potentially multiple fixtures (separated by ---)
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert(&registry);
        }
    }
}

#[test]
fn test_leaf_types() {
    run_fixtures_in_dir(&fixtures_dir().join("01_leaf_types"));
}

#[test]
fn test_descriptors() {
    run_fixtures_in_dir(&fixtures_dir().join("02_descriptors"));
}

#[test]
fn test_alternatives() {
    run_fixtures_in_dir(&fixtures_dir().join("03_alternatives"));
}

#[test]
fn test_defaults_and_init() {
    run_fixtures_in_dir(&fixtures_dir().join("04_defaults_and_init"));
}

#[test]
fn test_config_errors() {
    run_fixtures_in_dir(&fixtures_dir().join("05_config_errors"));
}
