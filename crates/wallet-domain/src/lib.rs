//! wallet-domain
//!
//! Pure domain models (Account, Transaction, Debt and their identifiers).
//! No I/O, no storage. Only data types, core enums and money helpers.

pub mod account;
pub mod common;
pub mod debt;
pub mod ids;
pub mod transaction;

pub use account::*;
pub use common::*;
pub use debt::*;
pub use ids::*;
pub use transaction::*;
