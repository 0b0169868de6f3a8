//! Reference-counted pub/sub client for the push feed.
//!
//! [`TransportClient`] owns one background task that holds the connection,
//! resubscribes after every reconnect, and delivers decoded messages to
//! per-topic handlers in registration order. Topic subscriptions are
//! reference counted: the wire `subscribe` frame is sent on the 0 → 1
//! transition and `unsubscribe` on 1 → 0.
//!
//! # Example
//!
//! ```rust,ignore
//! use courtside_api::transport::{TransportClient, WsConnector, ReconnectConfig};
//!
//! let client = TransportClient::new(WsConnector::new(ws_url), ReconnectConfig::default());
//! let _games = client.listen("games", |msg| println!("{:?}", msg.payload));
//! client.connect();
//! ```

mod backoff;
mod connection;
mod driver;
pub mod loopback;
mod registry;

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use backoff::ReconnectConfig;
pub use connection::{Connector, FrameSink, WireConnection, WsConnector};
pub use registry::{CallbackId, HandlerId};

use registry::{Callback, Handler, Lifecycle, Registry};

use crate::wire::{InboundMessage, Topic};

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection lifecycle as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Retrying after a lost connection or a failed attempt.
    Reconnecting { attempt: u32 },
    /// Reconnection attempts exhausted. Call `connect()` to start over.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Failed => f.write_str("offline"),
        }
    }
}

// ── Shared state ─────────────────────────────────────────────────────

pub(crate) struct Inner {
    connector: Arc<dyn Connector>,
    reconnect: ReconnectConfig,
    registry: Registry,
    lifecycle: Lifecycle,
    state: watch::Sender<ConnectionState>,
    last_message: watch::Sender<Option<Arc<InboundMessage>>>,
    /// Reconcile requests for the running task, if any.
    commands: Mutex<Option<mpsc::UnboundedSender<Topic>>>,
    task: Mutex<Option<Task>>,
}

struct Task {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl Inner {
    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                tracing::debug!(from = %current, to = %next, "Connection state change");
                *current = next;
                true
            }
        });
    }

    fn request_reconcile(&self, topic: Topic) {
        let commands = self.commands.lock().expect("transport command lock poisoned");
        if let Some(tx) = commands.as_ref() {
            // A closed channel means no task is running; the next connect
            // resubscribes from the registry.
            let _ = tx.send(topic);
        }
    }
}

// ── TransportClient ──────────────────────────────────────────────────

/// Handle to the push feed. Cheap to clone; all clones share one
/// connection and one subscription registry.
#[derive(Clone)]
pub struct TransportClient {
    inner: Arc<Inner>,
}

impl TransportClient {
    pub fn new(connector: impl Connector, reconnect: ReconnectConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (last_message, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                connector: Arc::new(connector),
                reconnect,
                registry: Registry::default(),
                lifecycle: Lifecycle::default(),
                state,
                last_message,
                commands: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Start the connection task. No-op while a task is already running
    /// (connecting, connected, or backing off). After
    /// [`ConnectionState::Failed`] this starts a fresh cycle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut task = self.inner.task.lock().expect("transport task lock poisoned");
        if task.as_ref().is_some_and(|t| !t.join.is_finished()) {
            tracing::debug!("connect() ignored, connection task already running");
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .commands
            .lock()
            .expect("transport command lock poisoned") = Some(tx);

        let cancel = CancellationToken::new();
        self.inner.set_state(ConnectionState::Connecting);
        let join = tokio::spawn(driver::run(Arc::clone(&self.inner), rx, cancel.clone()));
        *task = Some(Task { cancel, join });
    }

    /// Stop the connection task and wait for it to exit. Subscriptions
    /// and handlers survive; a later [`connect`](Self::connect) restores them.
    pub async fn disconnect(&self) {
        let task = self
            .inner
            .task
            .lock()
            .expect("transport task lock poisoned")
            .take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.join.await {
                tracing::warn!(error = %e, "Push feed task ended abnormally");
            }
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watch the connection state.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Watch the most recently delivered message.
    pub fn last_message(&self) -> watch::Receiver<Option<Arc<InboundMessage>>> {
        self.inner.last_message.subscribe()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Take a reference on `topic`. The wire subscription is only sent on
    /// the first reference.
    pub fn subscribe(&self, topic: impl Into<Topic>) {
        let topic = topic.into();
        if self.inner.registry.acquire(&topic) {
            tracing::debug!(%topic, "Topic activated");
            self.inner.request_reconcile(topic);
        }
    }

    /// Drop a reference on `topic`. The wire subscription is torn down when
    /// the last reference goes. Unsubscribing an unheld topic is a no-op.
    pub fn unsubscribe(&self, topic: impl Into<Topic>) {
        let topic = topic.into();
        if self.inner.registry.release(&topic) {
            tracing::debug!(%topic, "Topic released");
            self.inner.request_reconcile(topic);
        }
    }

    pub fn subscription_count(&self, topic: impl Into<Topic>) -> usize {
        self.inner.registry.count(&topic.into())
    }

    /// Topics with at least one reference, sorted.
    pub fn active_topics(&self) -> Vec<Topic> {
        self.inner.registry.active_topics()
    }

    /// Register a handler for every message delivered on `topic`.
    ///
    /// Handlers run on the connection task, in registration order, and
    /// must not block. A panicking handler is logged and skipped.
    pub fn on<F>(&self, topic: impl Into<Topic>, handler: F) -> HandlerId
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.inner.registry.add_handler(&topic.into(), handler)
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn off(&self, topic: impl Into<Topic>, id: HandlerId) -> bool {
        self.inner.registry.remove_handler(&topic.into(), id)
    }

    /// Subscribe and register a handler, both released when the returned
    /// guard drops.
    #[must_use = "dropping the Listener unsubscribes immediately"]
    pub fn listen<F>(&self, topic: impl Into<Topic>, handler: F) -> Listener
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.on(topic.clone(), handler);
        self.subscribe(topic.clone());
        Listener {
            client: self.clone(),
            topic,
            id,
        }
    }

    /// Hold a topic reference for the guard's lifetime.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscription(&self, topic: impl Into<Topic>) -> Subscription {
        let topic = topic.into();
        self.subscribe(topic.clone());
        Subscription {
            client: self.clone(),
            topic,
        }
    }

    // ── Lifecycle callbacks ──────────────────────────────────────────

    /// Called after every successful (re)connection, once topics have
    /// been resubscribed.
    pub fn on_connect(&self, callback: impl Fn() + Send + Sync + 'static) -> CallbackId {
        let id = self.inner.lifecycle.next_id();
        self.inner.lifecycle.connect.push(id, Arc::new(callback) as Callback);
        id
    }

    /// Called whenever an established connection ends.
    pub fn on_disconnect(&self, callback: impl Fn() + Send + Sync + 'static) -> CallbackId {
        let id = self.inner.lifecycle.next_id();
        self.inner.lifecycle.disconnect.push(id, Arc::new(callback) as Callback);
        id
    }

    /// Called after `on_connect` callbacks when the connection replaces a
    /// previous one in the same cycle, before any message is delivered.
    pub fn on_reconnect(&self, callback: impl Fn() + Send + Sync + 'static) -> CallbackId {
        let id = self.inner.lifecycle.next_id();
        self.inner.lifecycle.reconnect.push(id, Arc::new(callback) as Callback);
        id
    }

    pub fn remove_callback(&self, id: CallbackId) -> bool {
        self.inner.lifecycle.remove(id)
    }
}

// ── Scope guards ─────────────────────────────────────────────────────

/// A topic handler plus a topic reference, released on drop.
pub struct Listener {
    client: TransportClient,
    topic: Topic,
    id: HandlerId,
}

impl Listener {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.client.off(self.topic.clone(), self.id);
        self.client.unsubscribe(self.topic.clone());
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// A topic reference, released on drop.
pub struct Subscription {
    client: TransportClient,
    topic: Topic,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.client.unsubscribe(self.topic.clone());
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
