// Subscription registry: topic reference counts, per-topic handler lists,
// and the lifecycle callback lists.
//
// Handler lists are cloned out of the map before invocation so a handler
// may call back into the client (subscribe, off, ...) without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::wire::{InboundMessage, Topic};

/// Topic message handler.
pub type Handler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Connection lifecycle callback.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Identifies a registered topic handler, for [`off`](super::TransportClient::off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Identifies a registered lifecycle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

// ── Registry ─────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct Registry {
    refcounts: DashMap<Topic, usize>,
    handlers: DashMap<Topic, Vec<(HandlerId, Handler)>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Increment the topic's count. Returns `true` on the 0 → 1 transition.
    pub(crate) fn acquire(&self, topic: &Topic) -> bool {
        let mut count = self.refcounts.entry(topic.clone()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Decrement the topic's count. Returns `true` on the 1 → 0 transition.
    /// Releasing a topic that is not held is a no-op.
    pub(crate) fn release(&self, topic: &Topic) -> bool {
        match self.refcounts.entry(topic.clone()) {
            Entry::Occupied(mut held) => {
                if *held.get() <= 1 {
                    held.remove();
                    true
                } else {
                    *held.get_mut() -= 1;
                    false
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    pub(crate) fn count(&self, topic: &Topic) -> usize {
        self.refcounts.get(topic).map_or(0, |c| *c)
    }

    /// Topics with a non-zero count, sorted for deterministic resubscription.
    pub(crate) fn active_topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.refcounts.iter().map(|e| e.key().clone()).collect();
        topics.sort();
        topics
    }

    pub(crate) fn add_handler(&self, topic: &Topic, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(topic.clone())
            .or_default()
            .push((id, handler));
        id
    }

    pub(crate) fn remove_handler(&self, topic: &Topic, id: HandlerId) -> bool {
        let Some(mut list) = self.handlers.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|(hid, _)| *hid != id);
        let removed = list.len() != before;
        let empty = list.is_empty();
        drop(list);
        if empty {
            self.handlers.remove_if(topic, |_, l| l.is_empty());
        }
        removed
    }

    /// Snapshot of the topic's handlers in registration order.
    pub(crate) fn handlers_for(&self, topic: &Topic) -> Vec<Handler> {
        self.handlers
            .get(topic)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }
}

// ── Lifecycle callbacks ──────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct CallbackList {
    entries: Mutex<Vec<(CallbackId, Callback)>>,
}

impl CallbackList {
    pub(crate) fn push(&self, id: CallbackId, callback: Callback) {
        self.entries
            .lock()
            .expect("callback list lock poisoned")
            .push((id, callback));
    }

    pub(crate) fn remove(&self, id: CallbackId) -> bool {
        let mut entries = self.entries.lock().expect("callback list lock poisoned");
        let before = entries.len();
        entries.retain(|(cid, _)| *cid != id);
        entries.len() != before
    }

    /// Callbacks in registration order, cloned out of the lock.
    pub(crate) fn snapshot(&self) -> Vec<Callback> {
        self.entries
            .lock()
            .expect("callback list lock poisoned")
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect()
    }
}

#[derive(Default)]
pub(crate) struct Lifecycle {
    pub(crate) connect: CallbackList,
    pub(crate) disconnect: CallbackList,
    pub(crate) reconnect: CallbackList,
    next_id: AtomicU64,
}

impl Lifecycle {
    pub(crate) fn next_id(&self) -> CallbackId {
        CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn remove(&self, id: CallbackId) -> bool {
        self.connect.remove(id) || self.disconnect.remove(id) || self.reconnect.remove(id)
    }
}
