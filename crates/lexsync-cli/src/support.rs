use crate::config::{self, Settings};
use lexsync_fixture::{CanonicalNode, OracleError, Side, parse_fixture};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

pub fn load_settings_or_exit(config_path: &str) -> Settings {
    config::load(Path::new(config_path)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

/// Read and parse a fixture; parse failures are reported like verification
/// failures.
pub fn read_fixture_or_exit(path: &str, json_output: bool) -> CanonicalNode {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {path}: {e}");
        std::process::exit(1);
    });
    parse_fixture(&text).unwrap_or_else(|e| fail_and_exit(path, &e, json_output))
}

pub fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}

pub fn failure_payload(fixture: &str, err: &OracleError) -> Value {
    json!({
        "result": "fail",
        "fixture": fixture,
        "class": err.class(),
        "side": err.side(),
        "message": err.to_string(),
    })
}

pub fn fail_and_exit(fixture: &str, err: &OracleError, json_output: bool) -> ! {
    if json_output {
        print_json(&failure_payload(fixture, err));
    } else {
        eprintln!("error: {err}");
    }
    std::process::exit(1);
}

/// Print the outcome of one verification pass and exit non-zero on failure.
pub fn report_verification(
    fixture: &str,
    side: Side,
    target: &str,
    result: Result<(), OracleError>,
    json_output: bool,
) {
    if let Err(err) = result {
        fail_and_exit(fixture, &err, json_output);
    }
    if json_output {
        print_json(&json!({
            "result": "pass",
            "fixture": fixture,
            "side": side,
            "target": target,
        }));
    } else {
        println!("lexsync verify {side}");
        println!("  Fixture: {fixture}");
        println!("  Target: {target}");
        println!("  Result: pass");
    }
}
