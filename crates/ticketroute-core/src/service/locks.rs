//! Keyed serialization.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::ticket::TicketId;

/// Keyed async mutex: one lock per key.
///
/// Holders of the same key run one after another; different keys proceed in
/// parallel. Entries are dropped once no guard or waiter holds them.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Weak<AsyncMutex<()>>>>,
}

/// One lock per ticket id, held for a whole lifecycle operation.
pub type TicketLocks = KeyedLocks<TicketId>;

/// One lock per `(parent folder id, child name)`, held across a folder
/// get-or-create so that concurrent operations on different tickets do not
/// both create a shared branch such as `Cases` or `Active`.
pub type FolderLocks = KeyedLocks<(String, String)>;

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|_, weak| weak.strong_count() > 0);

            if let Some(existing) = entries.get(key).and_then(Weak::upgrade) {
                existing
            } else {
                let fresh = Arc::new(AsyncMutex::new(()));
                entries.insert(key.clone(), Arc::downgrade(&fresh));
                fresh
            }
        };
        entry.lock_owned().await
    }

    /// Number of keys with a live lock.
    #[must_use]
    pub fn active(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
