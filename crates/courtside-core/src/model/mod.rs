// ── Domain model ──
//
// Live entity snapshots come straight from the wire crate; everything the
// detector and notification pipeline produce is defined here.

mod event;
mod notification;

pub use courtside_api::model::{
    GameSnapshot, GameStatus, NoticeLevel, PlayerStatLine, ProjectionSnapshot, SystemNotice,
    TeamRef,
};
pub use event::{DomainEvent, EventKind, StatCategory};
pub use notification::{
    Notification, NotificationDraft, NotificationPage, NotificationPreferences,
    NotificationQuery, NotificationType, TypeToggles,
};
