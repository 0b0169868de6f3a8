// ── Engine facade ──
//
// Wires the data flow: push feed → synchronizers → detector → ordered
// signal queue → notification center. Tracker listeners run on the
// transport task and only enqueue; a single pump task awaits each
// dispatch in turn, so signals reach the center in arrival order.

use std::sync::{Arc, Mutex};

use courtside_api::{
    ConnectionState, InboundMessage, Listener, Payload, RestClient, Topic, TransportClient,
    WsConnector,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{GameSnapshot, PlayerStatLine, ProjectionSnapshot};
use crate::notify::{
    Channels, HttpNotificationRepository, HttpPreferenceSource, NotificationCenter,
    PreferenceSource, Signal, StaticPreferences,
};
use crate::sync::{EntityFilter, LiveEntity, LiveView, Synchronizer};

/// Notifications loaded from the store at sign-in.
const INITIAL_PAGE: u32 = 20;

struct Pump {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

struct EngineInner {
    transport: TransportClient,
    center: NotificationCenter,
    games: Arc<Synchronizer<GameSnapshot>>,
    players: Arc<Synchronizer<PlayerStatLine>>,
    projections: Arc<Synchronizer<ProjectionSnapshot>>,
    last_game: Arc<watch::Sender<Option<Arc<GameSnapshot>>>>,
    last_projection: Arc<watch::Sender<Option<Arc<ProjectionSnapshot>>>>,
    listeners: Mutex<Vec<Listener>>,
    pump: Mutex<Option<Pump>>,
}

/// A running sync-and-notify session.
///
/// Cheaply cloneable; clones share one session.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Build the transport, store and preference adapters from `config`,
    /// start the pipeline and begin connecting.
    ///
    /// The first page of stored notifications is loaded before returning;
    /// failing to load it is logged, not fatal.
    pub async fn connect(config: &EngineConfig, channels: Channels) -> Result<Self, CoreError> {
        let rest = RestClient::new(
            config.server_url.clone(),
            &config.http_config(),
            config.token.clone(),
        )?;

        let preferences: Arc<dyn PreferenceSource> = if config.remote_preferences {
            Arc::new(HttpPreferenceSource::new(rest.clone()))
        } else {
            Arc::new(StaticPreferences(config.preferences))
        };

        let mut builder = NotificationCenter::builder(config.user_id.clone())
            .preferences(preferences)
            .channels(channels)
            .store_timeout(config.store_timeout)
            .preference_timeout(config.timeout);
        if config.persistence {
            builder = builder.repository(Arc::new(HttpNotificationRepository::new(rest)));
        }
        let center = builder.build();

        if config.persistence {
            if let Err(e) = center.reload(INITIAL_PAGE).await {
                warn!(error = %e, "could not load stored notifications");
            }
        }

        let connector = WsConnector::new(config.ws_url.clone()).with_token(config.token.clone());
        let transport = TransportClient::new(connector, config.reconnect.clone());

        let engine = Self::start(transport, center);
        engine.inner.transport.connect();
        info!(url = %config.ws_url, user = %config.user_id, "engine started");
        Ok(engine)
    }

    /// Wire an existing transport and center together.
    ///
    /// Must be called inside a Tokio runtime. Does not connect the
    /// transport.
    pub fn start(transport: TransportClient, center: NotificationCenter) -> Self {
        let games = Arc::new(Synchronizer::new());
        let players = Arc::new(Synchronizer::new());
        let projections = Arc::new(Synchronizer::new());
        let (last_game, _) = watch::channel(None);
        let (last_projection, _) = watch::channel(None);
        let last_game = Arc::new(last_game);
        let last_projection = Arc::new(last_projection);

        let (tx, rx) = mpsc::unbounded_channel();

        let listeners = vec![
            track(&transport, &games, &tx, {
                let last_game = Arc::clone(&last_game);
                move |payload: &Payload| {
                    if let Payload::GameUpdate { game } = payload {
                        last_game.send_replace(Some(Arc::new(game.clone())));
                    }
                }
            }),
            track(&transport, &players, &tx, |_| {}),
            track(&transport, &projections, &tx, {
                let last_projection = Arc::clone(&last_projection);
                move |payload: &Payload| {
                    let latest = match payload {
                        Payload::ProjectionUpdate { projection } => Some(projection),
                        Payload::BulkProjectionsUpdate { projections } => projections.last(),
                        _ => None,
                    };
                    if let Some(projection) = latest {
                        last_projection.send_replace(Some(Arc::new(projection.clone())));
                    }
                }
            }),
            transport.listen(Topic::SYSTEM, {
                let tx = tx.clone();
                move |msg: &InboundMessage| {
                    if let Payload::SystemNotification(notice) = &msg.payload {
                        let _ = tx.send(Signal::System(notice.clone()));
                    }
                }
            }),
        ];

        let cancel = CancellationToken::new();
        let join = tokio::spawn(pump(center.clone(), rx, cancel.clone()));

        Self {
            inner: Arc::new(EngineInner {
                transport,
                center,
                games,
                players,
                projections,
                last_game,
                last_projection,
                listeners: Mutex::new(listeners),
                pump: Mutex::new(Some(Pump { cancel, join })),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn transport(&self) -> &TransportClient {
        &self.inner.transport
    }

    pub fn center(&self) -> &NotificationCenter {
        &self.inner.center
    }

    pub fn games(&self) -> &Synchronizer<GameSnapshot> {
        &self.inner.games
    }

    pub fn players(&self) -> &Synchronizer<PlayerStatLine> {
        &self.inner.players
    }

    pub fn projections(&self) -> &Synchronizer<ProjectionSnapshot> {
        &self.inner.projections
    }

    // ── Observables ──────────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.transport.connection_state()
    }

    pub fn last_message(&self) -> watch::Receiver<Option<Arc<InboundMessage>>> {
        self.inner.transport.last_message()
    }

    pub fn last_game_update(&self) -> watch::Receiver<Option<Arc<GameSnapshot>>> {
        self.inner.last_game.subscribe()
    }

    pub fn last_projection_update(&self) -> watch::Receiver<Option<Arc<ProjectionSnapshot>>> {
        self.inner.last_projection.subscribe()
    }

    /// Follow raw messages on `topics`, every frame in arrival order.
    ///
    /// Each topic is subscribed on the wire for as long as the feed is
    /// held, independently of the engine's own collection topics.
    pub fn raw_feed<I>(&self, topics: I) -> RawFeed
    where
        I: IntoIterator,
        I::Item: Into<Topic>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let listeners = topics
            .into_iter()
            .map(|topic| {
                let tx = tx.clone();
                self.inner.transport.listen(topic, move |msg| {
                    let _ = tx.send(msg.clone());
                })
            })
            .collect();
        RawFeed {
            rx,
            _listeners: listeners,
        }
    }

    /// Open a scoped, filtered view over one entity kind.
    pub fn live<T: LiveEntity>(
        &self,
        initial: impl IntoIterator<Item = T>,
        filter: EntityFilter<T>,
    ) -> LiveView<T> {
        LiveView::open(&self.inner.transport, initial, filter)
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Stop tracking, stop dispatching and close the push feed. Signals
    /// still queued are dropped.
    pub async fn shutdown(&self) {
        self.inner
            .listeners
            .lock()
            .expect("engine listeners lock poisoned")
            .clear();

        let pump = self.inner.pump.lock().expect("engine pump lock poisoned").take();
        if let Some(pump) = pump {
            pump.cancel.cancel();
            if let Err(e) = pump.join.await {
                warn!(error = %e, "notification pump ended abnormally");
            }
        }

        self.inner.transport.disconnect().await;
        debug!("engine shut down");
    }

    /// End the session: shut down and forget everything held in memory.
    pub async fn sign_out(&self) {
        self.shutdown().await;
        self.inner.games.clear();
        self.inner.players.clear();
        self.inner.projections.clear();
        self.inner.last_game.send_replace(None);
        self.inner.last_projection.send_replace(None);
        self.inner.center.reset();
        info!("signed out");
    }
}

/// Raw messages on a fixed set of topics. Dropping it unsubscribes.
#[derive(Debug)]
pub struct RawFeed {
    rx: mpsc::UnboundedReceiver<InboundMessage>,
    _listeners: Vec<Listener>,
}

impl RawFeed {
    /// Next message, or `None` once every listener is gone.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.inner.transport.state())
            .field("center", &self.inner.center)
            .finish_non_exhaustive()
    }
}

/// Listen on `T`'s collection topic, feed the synchronizer and queue the
/// resulting events. `observe` sees every payload first.
fn track<T, F>(
    transport: &TransportClient,
    sync: &Arc<Synchronizer<T>>,
    tx: &mpsc::UnboundedSender<Signal>,
    observe: F,
) -> Listener
where
    T: LiveEntity,
    F: Fn(&Payload) + Send + Sync + 'static,
{
    let sync = Arc::clone(sync);
    let tx = tx.clone();
    transport.listen(T::TOPIC, move |msg: &InboundMessage| {
        observe(&msg.payload);
        for event in sync.ingest(&msg.payload) {
            debug!(kind = %event.kind(), entity = event.entity_id(), "domain event");
            let _ = tx.send(Signal::Domain(event));
        }
    })
}

async fn pump(
    center: NotificationCenter,
    mut rx: mpsc::UnboundedReceiver<Signal>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            signal = rx.recv() => {
                let Some(signal) = signal else { break };
                center.dispatch(signal).await;
            }
        }
    }
}
