#![doc(test(attr(deny(warnings))))]

//! Vision Wallet keeps account balances in step with their transactions and
//! projects debt payoff under snowball and avalanche strategies.
//!
//! The work happens in the member crates, re-exported here as [`domain`],
//! [`core`] and [`config`]; this crate wires them into [`WalletService`] and
//! owns logging setup.

pub mod errors;
pub mod service;
pub mod utils;

pub use errors::{Result, WalletError};
pub use service::WalletService;
pub use wallet_config as config;
pub use wallet_core as core;
pub use wallet_domain as domain;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_config(&config::Config::default());
}

/// Initializes global tracing, honouring the config's log directive.
pub fn init_with_config(config: &config::Config) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(config.log_directive.as_deref());
        let build = utils::build_info::current();
        tracing::info!("Vision Wallet {} tracing initialized.", build.summary());
    });
}
