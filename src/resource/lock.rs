//! Named action locks
//!
//! Mutating operations of resource types that share a lock name run one at a
//! time within the process. Singleton create-or-lookup sequences use their own
//! name so that two workers never both decide to create the same entity.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
pub struct ActionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ActionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the named lock until the guard drops
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        tracing::trace!("acquiring action lock `{}`", name);
        lock.lock_owned().await
    }
}
