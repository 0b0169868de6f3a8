// ── Live views ──
//
// A consumer-scoped, filtered cache fed by one transport listener. The
// listener holds the topic reference, so dropping the view unsubscribes
// and releases the cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use courtside_api::{ConnectionState, Listener, TransportClient};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::{EntityFilter, LiveEntity};
use crate::store::EntityCache;

/// A filtered live collection of one entity kind.
pub struct LiveView<T: LiveEntity> {
    cache: Arc<EntityCache<T>>,
    values: watch::Receiver<Arc<Vec<Arc<T>>>>,
    state: watch::Receiver<ConnectionState>,
    listener: Listener,
}

impl<T: LiveEntity> LiveView<T> {
    /// Seed with server-fetched values and start following updates.
    ///
    /// Seeded values are visible immediately, before the transport has
    /// connected.
    pub fn open(
        transport: &TransportClient,
        initial: impl IntoIterator<Item = T>,
        filter: EntityFilter<T>,
    ) -> Self {
        let cache = Arc::new(EntityCache::new());
        for entity in initial.into_iter().filter(|e| filter.matches(e)) {
            cache.seed(entity.key(), entity);
        }

        let topic = filter.topic();
        let sink = Arc::clone(&cache);
        let listener = transport.listen(topic, move |msg| {
            for entity in T::extract(&msg.payload) {
                if filter.matches(&entity) {
                    sink.apply(entity.key(), entity);
                }
            }
        });

        tracing::debug!(topic = %listener.topic(), seeded = cache.len(), "live view opened");

        Self {
            values: cache.subscribe(),
            state: transport.connection_state(),
            cache,
            listener,
        }
    }

    /// Current values ordered by key.
    pub fn values(&self) -> Arc<Vec<Arc<T>>> {
        self.cache.snapshot()
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.cache.get(key)
    }

    /// Whether the transport is connected right now.
    pub fn is_live(&self) -> bool {
        self.state.borrow().is_connected()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.cache.last_update()
    }

    pub fn topic(&self) -> &courtside_api::Topic {
        self.listener.topic()
    }

    /// Wait for the next change and return the new values.
    ///
    /// Returns `None` only if the cache has gone away.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.values.changed().await.ok()?;
        Some(self.values.borrow_and_update().clone())
    }

    /// Stream of value snapshots, starting with the current one.
    ///
    /// The stream keeps yielding only while the view is alive.
    pub fn stream(&self) -> WatchStream<Arc<Vec<Arc<T>>>> {
        WatchStream::new(self.cache.subscribe())
    }
}

impl<T: LiveEntity> std::fmt::Debug for LiveView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("topic", self.listener.topic())
            .field("len", &self.cache.len())
            .finish_non_exhaustive()
    }
}
