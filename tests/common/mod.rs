#![allow(dead_code)]

use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use vision_wallet::{
    config::{Config, ConfigManager},
    domain::Debt,
    init_with_config, WalletService,
};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Config manager rooted in a fresh temporary directory.
pub fn temp_config_manager() -> ConfigManager {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    ConfigManager::with_base_dir(base).expect("create config manager for temp dir")
}

pub fn service() -> WalletService {
    service_with(Config::default())
}

pub fn service_with(config: Config) -> WalletService {
    init_with_config(&config);
    WalletService::new(config).expect("valid config")
}

/// Fixed "today" so payoff dates are reproducible.
pub fn plan_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

pub fn debt(name: &str, balance: Decimal, rate: Decimal, minimum: Decimal) -> Debt {
    Debt::new(name, balance, rate).with_minimum_payment(minimum)
}
