// ── Notification pipeline ──
//
// Signals (domain events, system notices) go through `NotificationCenter`,
// which gates on preferences, persists through a `NotificationRepository`,
// records into its list and fans out to the delivery channels.

mod center;
pub mod channels;
mod compose;
mod convert;
mod http;
mod memory;
mod ports;
mod state;

pub use center::{DispatchOutcome, LoadedPage, NotificationCenter, NotificationCenterBuilder, SuppressReason};
pub use channels::{
    ChannelError, ChannelOutcome, ChannelReport, Channels, DesktopChannel, Permission, Silent,
    SoundChannel, Toast, ToastChannel, ToastVariant,
};
pub use compose::Signal;
pub use http::{HttpNotificationRepository, HttpPreferenceSource};
pub use memory::MemoryRepository;
pub use ports::{NotificationRepository, PreferenceSource, StaticPreferences};
pub use state::NotificationState;
