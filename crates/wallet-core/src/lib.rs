//! wallet-core
//!
//! Balance synchronization and debt payoff planning.
//! Depends on wallet-domain. No terminal I/O, no disk I/O; persistence is
//! reached through the [`store::LedgerStore`] seam.

pub mod balance_sync;
pub mod effects;
pub mod error;
pub mod locks;
pub mod payoff_planner;
pub mod store;

pub use balance_sync::*;
pub use error::{CoreError, CoreResult};
pub use locks::AccountLocks;
pub use payoff_planner::*;
pub use store::{LedgerStore, LedgerUnit, MemoryLedger};
