//! Per-identifier mutual exclusion
//!
//! Keystore initialization and database re-encryption for the same
//! identity must not interleave. Commands for different identities are
//! unaffected.

use keybridge_core::KeyIdentifier;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

type Entries = HashMap<KeyIdentifier, Arc<Mutex<()>>>;

/// Lazily created mutex per key identifier
///
/// Entries are removed once nobody holds or waits on them, so the map only
/// ever contains identities with commands in flight.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    entries: Arc<Mutex<Entries>>,
}

impl KeyedLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `key_uid` is held
    pub fn acquire(&self, key_uid: &KeyIdentifier) -> KeyedLockGuard {
        let slot = {
            let mut entries = self.entries.lock();
            entries
                .entry(key_uid.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        KeyedLockGuard {
            key_uid: key_uid.clone(),
            guard: Some(slot.lock_arc()),
            entries: self.entries.clone(),
        }
    }

    /// Number of identities with a lock held or awaited
    pub fn active_keys(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Held lock for one identity; releasing it may retire the table entry
pub struct KeyedLockGuard {
    key_uid: KeyIdentifier,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
    entries: Arc<Mutex<Entries>>,
}

impl KeyedLockGuard {
    /// Identity this guard serializes
    pub fn key_uid(&self) -> &KeyIdentifier {
        &self.key_uid
    }
}

impl Drop for KeyedLockGuard {
    fn drop(&mut self) {
        // Release the identity lock before inspecting the table.
        drop(self.guard.take());

        let mut entries = self.entries.lock();
        let idle = entries
            .get(&self.key_uid)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            entries.remove(&self.key_uid);
        }
    }
}

impl std::fmt::Debug for KeyedLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLockGuard")
            .field("key_uid", &self.key_uid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn key(raw: &str) -> KeyIdentifier {
        KeyIdentifier::parse(raw).unwrap()
    }

    #[test]
    fn test_entry_retired_after_release() {
        let locks = KeyedLocks::new();
        {
            let guard = locks.acquire(&key("a"));
            assert_eq!(guard.key_uid().as_str(), "a");
            assert_eq!(locks.active_keys(), 1);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire(&key("a"));
        let _b = locks.acquire(&key("b"));
        assert_eq!(locks.active_keys(), 2);
    }

    #[test]
    fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let peak = peak.clone();
                thread::spawn(move || {
                    let _guard = locks.acquire(&key("shared"));
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }
}
