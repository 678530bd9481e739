//! In-process locks serialising uploads into the same directory

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutexes keyed by target directory
///
/// The existence checks and the final move of an upload are separate
/// filesystem calls. Holding the directory lock across them keeps two uploads
/// in the same process from claiming the same destination.
#[derive(Debug, Default)]
pub struct DirectoryLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DirectoryLocks {
    /// Creates an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and acquires the lock on `directory`
    ///
    /// Entries no guard or waiter refers to any more are dropped on the way.
    pub async fn lock(&self, directory: &str) -> OwnedMutexGuard<()> {
        let key = normalize_lock_key(directory);
        let lock = {
            let mut locks = self.locks.lock().await;
            // The table's own reference is the only one left on idle entries
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked_directories(&self) -> usize {
        self.locks.lock().await.len()
    }
}

fn normalize_lock_key(directory: &str) -> String {
    let key = directory.trim().replace('\\', "/");
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
