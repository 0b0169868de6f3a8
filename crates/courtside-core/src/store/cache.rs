// ── Reactive entity cache ──
//
// Concurrent keyed storage holding the previous and current snapshot of
// each entity, with push-based change notification via `watch` channels.
// Snapshots are replaced wholesale; nothing is merged field by field.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

struct Slot<T> {
    previous: Option<Arc<T>>,
    current: Arc<T>,
}

/// Result of applying one inbound snapshot.
#[derive(Debug)]
pub struct Transition<T> {
    pub previous: Option<Arc<T>>,
    pub current: Arc<T>,
}

/// A reactive cache for a single entity kind.
///
/// Every mutation rebuilds a key-ordered snapshot that subscribers
/// receive. Only [`apply`](Self::apply) advances the last-update time;
/// seeding with server-fetched initial values does not.
pub struct EntityCache<T: Send + Sync + 'static> {
    slots: DashMap<String, Slot<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
    last_update: watch::Sender<Option<DateTime<Utc>>>,
}

impl<T: Send + Sync + 'static> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> EntityCache<T> {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (last_update, _) = watch::channel(None);
        Self {
            slots: DashMap::new(),
            snapshot,
            last_update,
        }
    }

    /// Record a baseline value. Any previous snapshot for the key is
    /// forgotten.
    pub fn seed(&self, key: String, value: T) {
        self.slots.insert(
            key,
            Slot {
                previous: None,
                current: Arc::new(value),
            },
        );
        self.rebuild_snapshot();
    }

    /// Replace the snapshot for `key`, returning the old and new values.
    pub fn apply(&self, key: String, value: T) -> Transition<T> {
        let current = Arc::new(value);
        let previous = match self.slots.entry(key) {
            Entry::Occupied(mut held) => {
                let slot = held.get_mut();
                let old = std::mem::replace(&mut slot.current, Arc::clone(&current));
                slot.previous = Some(Arc::clone(&old));
                Some(old)
            }
            Entry::Vacant(empty) => {
                empty.insert(Slot {
                    previous: None,
                    current: Arc::clone(&current),
                });
                None
            }
        };

        self.rebuild_snapshot();
        self.last_update.send_replace(Some(Utc::now()));

        Transition { previous, current }
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.slots.get(key).map(|slot| Arc::clone(&slot.current))
    }

    /// The snapshot that `key` held before its latest update.
    pub fn previous(&self, key: &str) -> Option<Arc<T>> {
        self.slots.get(key).and_then(|slot| slot.previous.clone())
    }

    pub fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.slots.remove(key).map(|(_, slot)| slot.current);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub fn clear(&self) {
        self.slots.clear();
        self.rebuild_snapshot();
    }

    /// Current values ordered by key (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// When the last inbound update was applied, if ever.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.borrow()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(String, Arc<T>)> = self
            .slots
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(&r.value().current)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_apply_has_no_previous() {
        let cache: EntityCache<u32> = EntityCache::new();
        let t = cache.apply("a".into(), 1);
        assert!(t.previous.is_none());
        assert_eq!(*t.current, 1);
        assert!(cache.last_update().is_some());
    }

    #[test]
    fn apply_replaces_and_remembers_previous() {
        let cache: EntityCache<u32> = EntityCache::new();
        cache.apply("a".into(), 1);
        let t = cache.apply("a".into(), 2);

        assert_eq!(*t.previous.unwrap(), 1);
        assert_eq!(*cache.get("a").unwrap(), 2);
        assert_eq!(*cache.previous("a").unwrap(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn seed_sets_baseline_without_touching_last_update() {
        let cache: EntityCache<u32> = EntityCache::new();
        cache.seed("a".into(), 10);
        assert!(cache.last_update().is_none());

        let t = cache.apply("a".into(), 11);
        assert_eq!(*t.previous.unwrap(), 10);
    }

    #[test]
    fn snapshot_is_ordered_by_key() {
        let cache: EntityCache<&'static str> = EntityCache::new();
        cache.apply("b".into(), "second");
        cache.apply("a".into(), "first");
        cache.apply("c".into(), "third");

        let snap: Vec<&str> = cache.snapshot().iter().map(|v| **v).collect();
        assert_eq!(snap, vec!["first", "second", "third"]);
    }

    #[test]
    fn remove_and_clear_update_subscribers() {
        let cache: EntityCache<u32> = EntityCache::new();
        let mut rx = cache.subscribe();
        cache.apply("a".into(), 1);
        cache.apply("b".into(), 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);

        assert_eq!(*cache.remove("a").unwrap(), 1);
        assert!(cache.remove("a").is_none());
        assert_eq!(rx.borrow_and_update().len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.snapshot().is_empty());
    }
}
