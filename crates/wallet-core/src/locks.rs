//! Per-account mutual exclusion for balance mutations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use wallet_domain::AccountId;

use crate::{CoreError, CoreResult};

/// Registry handing out one mutex per account.
///
/// Events touching the same account serialize on that account's mutex while
/// events on disjoint accounts proceed in parallel. A slot lives only while
/// some [`LockSet`] holds it.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the mutexes for `ids`, sorted and de-duplicated so every caller
    /// acquires them in the same global order.
    pub fn lock_set(&self, ids: impl IntoIterator<Item = AccountId>) -> CoreResult<LockSet<'_>> {
        let mut ids: Vec<AccountId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();

        let mut slots = self
            .slots
            .lock()
            .map_err(|_| CoreError::LockPoisoned("account lock registry".into()))?;
        let handles = ids
            .into_iter()
            .map(|id| {
                let handle = slots.entry(id).or_default().clone();
                (id, handle)
            })
            .collect();
        Ok(LockSet {
            registry: self,
            handles,
        })
    }

    pub fn tracked_accounts(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or_default()
    }
}

/// Ordered mutexes for the accounts one event touches.
#[derive(Debug)]
pub struct LockSet<'a> {
    registry: &'a AccountLocks,
    handles: Vec<(AccountId, Arc<Mutex<()>>)>,
}

impl LockSet<'_> {
    /// Blocks until every mutex in the set is held.
    pub fn acquire(&self) -> CoreResult<Vec<MutexGuard<'_, ()>>> {
        self.handles
            .iter()
            .map(|(id, handle)| {
                handle
                    .lock()
                    .map_err(|_| CoreError::LockPoisoned(format!("account {id}")))
            })
            .collect()
    }

    pub fn covers(&self, ids: &[AccountId]) -> bool {
        ids.iter()
            .all(|id| self.handles.iter().any(|(held, _)| held == id))
    }

    pub fn accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.handles.iter().map(|(id, _)| *id)
    }
}

impl Drop for LockSet<'_> {
    fn drop(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        // Registry clones happen under the same mutex, so a count of one means
        // no other set can be holding or about to take this slot.
        if let Ok(mut slots) = self.registry.slots.lock() {
            for (id, handle) in handles {
                drop(handle);
                if slots.get(&id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                    slots.remove(&id);
                }
            }
        }
    }
}
