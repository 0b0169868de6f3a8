// courtside-core: live entity sync, milestone detection and notification
// dispatch between courtside-api and consumers (CLI, embedding apps).

pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod model;
pub mod notify;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EngineConfig, TlsVerification};
pub use engine::{Engine, RawFeed};
pub use error::CoreError;
pub use notify::{
    Channels, DispatchOutcome, MemoryRepository, NotificationCenter, NotificationRepository,
    PreferenceSource, Signal, StaticPreferences,
};
pub use store::EntityCache;
pub use sync::{EntityFilter, LiveEntity, LiveView, Synchronizer};

pub use courtside_api::{
    ConnectionState, InboundMessage, Payload, ReconnectConfig, Topic, TransportClient,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DomainEvent, EventKind, GameSnapshot, GameStatus, Notification, NotificationDraft,
    NotificationPreferences, NotificationQuery, NotificationType, PlayerStatLine,
    ProjectionSnapshot, StatCategory, SystemNotice, TypeToggles,
};
