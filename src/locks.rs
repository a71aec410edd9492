//! Per-address issuance serialization
//!
//! Two issuances from one address would race on the same spendables. Handlers
//! that share an [`IssuanceLocks`] registry run one issuance per address at a
//! time; different addresses proceed in parallel. An address's entry is
//! dropped once no issuance holds or waits on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct IssuanceLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl IssuanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, address: &str) -> Arc<Mutex<()>> {
        // Entries hold no data, so a poisoned map is still usable
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release(&self, address: &str, lock: Arc<Mutex<()>>) {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        drop(lock);
        // Clones are only handed out under the map lock, so a count of one
        // means nobody else holds or waits on this entry
        if map.get(address).is_some_and(|l| Arc::strong_count(l) == 1) {
            map.remove(address);
        }
    }

    /// Run `f` while holding the lock for `address`
    pub fn run<T>(&self, address: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(address);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());
            log::debug!("Holding issuance lock for {}", address);
            f()
        };
        self.release(address, lock);
        result
    }

    /// Addresses with an issuance running or waiting
    pub fn active_addresses(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
