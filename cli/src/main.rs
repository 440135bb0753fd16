//! datashape CLI: load a schema config and check data files against it.
//!
//! Subcommands:
//! - `check <schema>`: verify the schema loads without errors
//! - `validate <schema> <data> [--no-init-root]`: print the normalized data
//! - `match <schema> <data>`: print the raw match outcome and report
//! - `info`: print registered classes and hooks
//!
//! Logging goes to stderr, filtered by the `DATASHAPE_LOG` environment
//! variable (default `warn`).

use std::path::Path;
use std::process;

use datashape::{Registry, SchemaConfig, Shape, ValidateOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DATASHAPE_LOG";

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "validate" => cmd_validate(&args[2..]),
        "match" => cmd_match(&args[2..]),
        "info" => cmd_info(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(args: &[String]) -> Result<(), String> {
    let [schema_path] = args else {
        return Err("check requires a schema file path".into());
    };

    load_shape(schema_path)?;
    println!("Schema valid");
    Ok(())
}

fn cmd_validate(args: &[String]) -> Result<(), String> {
    let (paths, options) = parse_validate_args(args)?;
    let [schema_path, data_path] = paths.as_slice() else {
        return Err("validate requires a schema file path and a data file path".into());
    };

    let shape = load_shape(schema_path)?;
    let data = load_data(data_path)?;

    let normalized = shape
        .validate_with(data, options)
        .map_err(|e| e.to_string())?;
    let json = normalized.to_json().map_err(|e| format!("cannot render output: {e}"))?;
    println!("{}", pretty(&json)?);
    Ok(())
}

fn cmd_match(args: &[String]) -> Result<(), String> {
    let [schema_path, data_path] = args else {
        return Err("match requires a schema file path and a data file path".into());
    };

    let shape = load_shape(schema_path)?;
    let data = load_data(data_path)?;

    let result = shape.match_value(&data);
    println!("matched: {}", result.is_match());
    println!("mismatches: {}", result.mismatch_count());
    if let Some(report) = result.report() {
        println!("{report}");
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_info() -> Result<(), String> {
    let registry = build_registry();

    println!("Registered classes:");
    for name in registry.class_names() {
        println!("  {name}");
    }

    println!("\nRegistered validate hooks:");
    for name in registry.validator_names() {
        println!("  {name}");
    }

    println!("\nRegistered init hooks:");
    for name in registry.initializer_names() {
        println!("  {name}");
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> Registry {
    let builder = datashape::RegistryBuilder::new();
    datashape_test::register(builder).build()
}

fn load_shape(path: &str) -> Result<Shape, String> {
    let config: SchemaConfig = serde_json::from_value(read_document(path)?)
        .map_err(|e| format!("schema config invalid: {e}"))?;

    let shape = build_registry()
        .load_shape(config)
        .map_err(|e| format!("schema invalid: {e}"))?;
    debug!(path, depth = shape.schema().depth(), "schema loaded");
    Ok(shape)
}

fn load_data(path: &str) -> Result<datashape::Value, String> {
    read_document(path).map(datashape_test::decode)
}

// ═══════════════════════════════════════════════════════════════════════════════
// File loading
// ═══════════════════════════════════════════════════════════════════════════════

fn read_document(path: &str) -> Result<serde_json::Value, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;
    parse_document(path, &content)
}

fn parse_document(path: &str, content: &str) -> Result<serde_json::Value, String> {
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

fn pretty(json: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(json).map_err(|e| e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_validate_args(args: &[String]) -> Result<(Vec<&str>, ValidateOptions), String> {
    let mut paths = Vec::new();
    let mut options = ValidateOptions::default();

    for arg in args {
        match arg.as_str() {
            "--no-init-root" => options = ValidateOptions::without_root_init(),
            flag if flag.starts_with("--") => {
                return Err(format!("unexpected argument \"{flag}\""));
            }
            path => paths.push(path),
        }
    }

    Ok((paths, options))
}

fn print_usage() {
    eprintln!(
        "Usage: datashape <command> [options]

Commands:
  check <schema>                             Validate schema config
  validate <schema> <data> [--no-init-root]  Print normalized data or the mismatch
  match <schema> <data>                      Print match outcome and report
  info                                       Print registered classes and hooks
  help                                       Show this help

Files ending in .json are read as JSON, everything else as YAML.
Set {LOG_ENV}=debug to trace matching decisions."
    );
}
