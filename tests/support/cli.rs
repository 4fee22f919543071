use std::path::Path;
use std::str::FromStr;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use rust_decimal::Decimal;
use serde_json::Value;

/// `pointbook` with its home and data directory confined to `home`.
pub fn pointbook(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("pointbook");
    cmd.env("HOME", home)
        .env("POINTBOOK_DATA_DIR", home.join("data"))
        .env("RUST_LOG", "warn");
    cmd
}

/// Run `pointbook --json <args>` and parse its stdout.
pub fn json(home: &Path, args: &[&str]) -> Value {
    let output = pointbook(home)
        .arg("--json")
        .args(args)
        .output()
        .expect("run pointbook");
    assert!(
        output.status.success(),
        "pointbook {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
}

/// Read a decimal that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}
