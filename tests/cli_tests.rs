mod support;

use std::fs;

use predicates::prelude::*;
use rust_decimal_macros::dec;

use support::cli::{decimal, json, pointbook};

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    pointbook(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pointbook"))
        .stdout(predicate::str::contains("market"))
        .stdout(predicate::str::contains("faucet"))
        .stdout(predicate::str::contains("settings"));
}

#[test]
fn market_lifecycle_through_the_cli() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();

    let faucet = json(home, &["faucet", "0xALICE"]);
    assert_eq!(faucet["wallet"]["address"], "0xalice");
    assert_eq!(decimal(&faucet["wallet"]["points"]), dec!(1000));

    let created = json(home, &["market", "create", "Will it rain?"]);
    let market_id = created["market"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["market"]["type"], "YES_NO");

    let quote = json(home, &["market", "quote", &market_id, "yes", "100"]);
    assert_eq!(decimal(&quote["quote"]["shares"]), dec!(200));

    let trade = json(home, &["trade", &market_id, "YES", "100", "--wallet", "0xalice"]);
    assert_eq!(decimal(&trade["balance"]), dec!(900));
    assert!(decimal(&trade["newPrice"]) > dec!(0.5));

    let listed = json(home, &["market", "list"]);
    assert_eq!(listed["markets"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&listed["markets"][0]["poolUSD"]), dec!(100));

    let resolved = json(home, &["market", "resolve", &market_id, "yes"]);
    assert_eq!(decimal(&resolved["winnerPool"]), dec!(80));
    assert_eq!(resolved["claims"].as_array().unwrap().len(), 1);

    let claimed = json(home, &["claim", &market_id, "--wallet", "0xalice"]);
    assert_eq!(decimal(&claimed["paid"]), dec!(80));
    assert_eq!(decimal(&claimed["wallet"]["points"]), dec!(980));

    pointbook(home)
        .args(["claim", &market_id, "--wallet", "0xalice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to claim"));
}

#[test]
fn trading_on_an_unknown_market_fails() {
    let home = tempfile::tempdir().unwrap();
    json(home.path(), &["faucet", "bob"]);

    pointbook(home.path())
        .args(["trade", "nope", "no", "5", "--wallet", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("market not found"));
}

#[test]
fn admin_mode_gates_market_creation() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();

    json(home, &["settings", "allow", "0xadmin"]);
    json(home, &["settings", "admin", "on"]);

    pointbook(home)
        .args(["market", "create", "Q?", "--as", "0xguest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));

    let created = json(home, &["market", "create", "Q?", "--as", "0xADMIN"]);
    assert!(created["market"]["id"].is_string());

    let settings = json(home, &["settings", "show"]);
    assert_eq!(settings["settings"]["adminMode"], true);
    assert_eq!(settings["settings"]["allowlist"][0], "0xadmin");
}

#[test]
fn reset_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();
    json(home, &["market", "create", "Q?"]);

    let unconfirmed = json(home, &["reset"]);
    assert_eq!(unconfirmed["status"], "unconfirmed");
    assert_eq!(json(home, &["market", "list"])["markets"].as_array().unwrap().len(), 1);

    json(home, &["reset", "--yes"]);
    assert!(json(home, &["market", "list"])["markets"].as_array().unwrap().is_empty());
}

#[test]
fn human_output_and_quiet_mode() {
    let home = tempfile::tempdir().unwrap();

    pointbook(home.path())
        .args(["market", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Markets"))
        .stdout(predicate::str::contains("(none)"));

    pointbook(home.path())
        .args(["--quiet", "faucet", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn explicit_config_selects_storage() {
    let home = tempfile::tempdir().unwrap();
    let data = home.path().join("elsewhere");
    let config = home.path().join("pointbook.toml");
    fs::write(
        &config,
        format!(
            "[storage]\nbackend = \"file\"\npath = \"{}\"\n",
            data.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    pointbook(home.path())
        .env_remove("POINTBOOK_DATA_DIR")
        .args(["--json", "faucet", "dave", "--config"])
        .arg(&config)
        .assert()
        .success();

    assert!(data.join("state.json").is_file());
}

#[test]
fn invalid_config_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("bad.toml");
    fs::write(&config, "[ledger]\nmax_commit_retries = 0\n").unwrap();

    pointbook(home.path())
        .args(["market", "list", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_commit_retries"));
}
