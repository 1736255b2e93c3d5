//! Per-collection lock striping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Exclusion lock for a single collection.
pub(crate) type CollectionLock = Arc<Mutex<()>>;

/// Maps collection names to their exclusion locks.
///
/// The guard mutex is held only while looking up or inserting an entry, never
/// across file I/O. Entries are never removed.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<String, CollectionLock>>,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `collection`, creating it on first use.
    pub(crate) fn get_or_create(&self, collection: &str) -> CollectionLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(lock) = locks.get(collection) {
            return Arc::clone(lock);
        }

        let lock = CollectionLock::default();
        locks.insert(collection.to_string(), Arc::clone(&lock));
        lock
    }

    /// Number of collections that have ever been locked.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Block until `lock` is held.
///
/// The lock guards no data, so a poisoned lock is still usable.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_collection_shares_lock() {
        let table = LockTable::new();
        let a = table.get_or_create("users");
        let b = table.get_or_create("users");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_collections_get_distinct_locks() {
        let table = LockTable::new();
        let a = table.get_or_create("users");
        let b = table.get_or_create("orders");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_held_lock_blocks_same_collection() {
        let table = Arc::new(LockTable::new());
        let lock = table.get_or_create("users");
        let guard = acquire(&lock);

        let (tx, rx) = mpsc::channel();
        let table2 = Arc::clone(&table);
        let handle = thread::spawn(move || {
            let lock = table2.get_or_create("users");
            let _guard = acquire(&lock);
            tx.send(()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_held_lock_does_not_block_other_collection() {
        let table = Arc::new(LockTable::new());
        let lock = table.get_or_create("users");
        let _guard = acquire(&lock);

        let (tx, rx) = mpsc::channel();
        let table2 = Arc::clone(&table);
        let handle = thread::spawn(move || {
            let lock = table2.get_or_create("orders");
            let _guard = acquire(&lock);
            tx.send(()).unwrap();
        });

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let table = Arc::new(LockTable::new());
        let lock = table.get_or_create("users");

        let poisoner = Arc::clone(&lock);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        let _guard = acquire(&lock);
    }
}
