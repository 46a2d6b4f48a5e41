use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

pub const RECENT_EVENT_CAPACITY: usize = 2000;

/// Lock-table size above which idle per-user locks are dropped.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Process-wide set of recently seen event ids.
///
/// Cleared wholesale when it outgrows its capacity, so a redelivery that
/// straddles a clear is processed again.
pub struct RecentEvents {
    capacity: usize,
    seen: Mutex<HashSet<String>>,
}

impl Default for RecentEvents {
    fn default() -> Self {
        Self::with_capacity(RECENT_EVENT_CAPACITY)
    }
}

impl RecentEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Records `id`; false when it was already seen.
    pub fn first_sighting(&self, id: &str) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seen.contains(id) {
            return false;
        }
        if seen.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "clearing recently seen event ids");
            seen.clear();
        }
        seen.insert(id.to_string());
        true
    }
}

/// One async mutex per user so a user's events are handled one at a time.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if locks.len() > LOCK_PRUNE_THRESHOLD {
                // Only entries nobody else holds or waits on.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(user_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_duplicate_ids_rejected() {
        let recent = RecentEvents::default();
        assert!(recent.first_sighting("wamid.1"));
        assert!(!recent.first_sighting("wamid.1"));
        assert!(recent.first_sighting("wamid.2"));
    }

    #[test]
    fn test_cleared_on_overflow() {
        let recent = RecentEvents::with_capacity(2);
        assert!(recent.first_sighting("a"));
        assert!(recent.first_sighting("b"));
        assert!(recent.first_sighting("c"));
        // "a" was forgotten by the clear.
        assert!(recent.first_sighting("a"));
        assert!(!recent.first_sighting("c"));
    }

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = Arc::new(SessionLocks::default());
        let guard = locks.acquire("u1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("u1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Other users are not blocked.
        let _other = locks.acquire("u2").await;

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 2);
    }
}
