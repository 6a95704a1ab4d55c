use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vision_wallet::config::{Config, ConfigManager};

fn wallet_sim() -> Command {
    Command::cargo_bin("wallet_sim").expect("binary built")
}

/// Runs against a config directory inside `dir` instead of the user's own.
fn wallet_sim_in(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = wallet_sim();
    cmd.arg("--config-dir").arg(dir.child("config").path());
    cmd
}

const SINGLE_CARD: &str = r#"{
    "debts": [
        {"name": "Card", "balance": 150000, "annual_interest_rate": 18, "minimum_payment": 3000}
    ]
}"#;

#[test]
fn prints_both_plans_as_json() {
    let dir = assert_fs::TempDir::new().unwrap();
    let request = dir.child("request.json");
    request
        .write_str(
            r#"{
                "debts": [
                    {"name": "Card", "balance": 150000, "annual_interest_rate": 18, "minimum_payment": 3000}
                ],
                "extra_monthly_payment": 2000
            }"#,
        )
        .unwrap();

    let output = wallet_sim_in(&dir)
        .arg(request.path())
        .args(["--today", "2024-01-01"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let plans: serde_json::Value = serde_json::from_slice(&output).expect("json on stdout");
    for strategy in ["snowball", "avalanche"] {
        assert_eq!(plans[strategy]["months_to_payoff"], 41);
        assert_eq!(plans[strategy]["total_interest_paid"], "50774.74");
        assert_eq!(plans[strategy]["payoff_date"], "2027-05-15");
        assert_eq!(plans[strategy]["timeline"].as_array().unwrap().len(), 41);
    }
}

#[test]
fn negative_extra_payment_fails_with_message() {
    let dir = assert_fs::TempDir::new().unwrap();
    let request = dir.child("bad.json");
    request
        .write_str(r#"{"debts": [], "extra_monthly_payment": -5}"#)
        .unwrap();

    wallet_sim_in(&dir)
        .arg(request.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("extra monthly payment must not be negative"));
}

#[test]
fn missing_extra_payment_falls_back_to_configured_default() {
    let dir = assert_fs::TempDir::new().unwrap();
    ConfigManager::with_base_dir(dir.child("config").path().to_path_buf())
        .unwrap()
        .save(&Config {
            default_extra_payment: dec!(2000),
            ..Config::default()
        })
        .unwrap();
    let request = dir.child("request.json");
    request.write_str(SINGLE_CARD).unwrap();

    let output = wallet_sim_in(&dir)
        .arg(request.path())
        .args(["--today", "2024-01-01"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let plans: serde_json::Value = serde_json::from_slice(&output).expect("json on stdout");
    let budget: Decimal = plans["snowball"]["monthly_budget"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("budget as decimal string");
    assert_eq!(budget, dec!(5000));
    assert_eq!(plans["snowball"]["months_to_payoff"], 41);
}

#[test]
fn configured_log_directive_reaches_stderr_only() {
    let dir = assert_fs::TempDir::new().unwrap();
    ConfigManager::with_base_dir(dir.child("config").path().to_path_buf())
        .unwrap()
        .save(&Config {
            log_directive: Some("wallet_core::payoff_planner=debug".into()),
            ..Config::default()
        })
        .unwrap();
    let request = dir.child("request.json");
    request.write_str(SINGLE_CARD).unwrap();

    let assert = wallet_sim_in(&dir)
        .env_remove("RUST_LOG")
        .arg(request.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Snowball plan:"));
    let stdout = &assert.get_output().stdout;
    serde_json::from_slice::<serde_json::Value>(stdout).expect("stdout stays pure json");
}

#[test]
fn invalid_config_is_reported() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("config/config.json")
        .write_str(r#"{"locale": "en-US", "currency": "USD", "default_extra_payment": "-1"}"#)
        .unwrap();
    let request = dir.child("request.json");
    request.write_str(SINGLE_CARD).unwrap();

    wallet_sim_in(&dir)
        .arg(request.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Configuration error"));
}

#[test]
fn missing_file_is_reported() {
    let dir = assert_fs::TempDir::new().unwrap();
    wallet_sim_in(&dir)
        .arg("/definitely/not/here.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn missing_argument_prints_usage() {
    wallet_sim()
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage: wallet_sim"));
}
