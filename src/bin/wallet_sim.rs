use std::{env, fs, path::PathBuf, process};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;
use vision_wallet::{
    config::{Config, ConfigManager},
    core::{PayoffPlanner, PayoffRequest},
    domain::Debt,
    init, init_with_config,
    utils::build_info,
    Result, WalletError,
};

const USAGE: &str =
    "usage: wallet_sim <request.json> [--today YYYY-MM-DD] [--config-dir DIR]";

/// Request file as written by users; a missing extra payment falls back to
/// the configured default.
#[derive(Debug, Deserialize)]
struct SimRequest {
    debts: Vec<Debt>,
    #[serde(default)]
    extra_monthly_payment: Option<Decimal>,
}

#[derive(Debug, Default)]
struct Options {
    path: Option<String>,
    today: Option<NaiveDate>,
    config_dir: Option<PathBuf>,
    version: bool,
}

impl Options {
    fn parse(args: Vec<String>) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--version" | "-V" => options.version = true,
                "--today" => {
                    let raw = args
                        .next()
                        .ok_or_else(|| WalletError::InvalidInput("--today needs a date".into()))?;
                    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|err| {
                        WalletError::InvalidInput(format!("bad --today value `{raw}`: {err}"))
                    })?;
                    options.today = Some(date);
                }
                "--config-dir" => {
                    let dir = args.next().ok_or_else(|| {
                        WalletError::InvalidInput("--config-dir needs a directory".into())
                    })?;
                    options.config_dir = Some(PathBuf::from(dir));
                }
                _ if options.path.is_none() => options.path = Some(arg),
                _ => return Err(WalletError::InvalidInput(USAGE.into())),
            }
        }
        Ok(options)
    }
}

fn main() {
    if let Err(err) = run(env::args().skip(1).collect()) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let options = match Options::parse(args) {
        Ok(options) => options,
        Err(err) => {
            init();
            return Err(err);
        }
    };
    if options.version {
        init();
        println!("wallet_sim {}", build_info::current().summary());
        return Ok(());
    }

    let config = load_config(&options)?;
    let path = options
        .path
        .ok_or_else(|| WalletError::InvalidInput(USAGE.into()))?;

    let input: SimRequest = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let request = PayoffRequest::new(
        input.debts,
        input
            .extra_monthly_payment
            .unwrap_or(config.default_extra_payment),
    );
    let today = options.today.unwrap_or_else(|| Utc::now().date_naive());
    let plans = PayoffPlanner::plan_on(&request, today)?;
    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}

/// Loads the user's config and initializes logging from it. An explicit
/// `--config-dir` must load; the platform default falls back to defaults.
fn load_config(options: &Options) -> Result<Config> {
    let loaded = match &options.config_dir {
        Some(dir) => ConfigManager::with_base_dir(dir.clone()),
        None => ConfigManager::from_default_dir(),
    }
    .and_then(|manager| manager.load());

    match loaded {
        Ok(config) => {
            init_with_config(&config);
            Ok(config)
        }
        Err(err) if options.config_dir.is_none() => {
            init();
            warn!("using default settings, config could not be loaded: {}", err);
            Ok(Config::default())
        }
        Err(err) => {
            init();
            Err(err.into())
        }
    }
}
