// ── Delivery channels ──
//
// Synchronous sinks for a dispatched notification. Each one is driven
// independently: a failure in one never blocks the others or the
// already-recorded notification.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::model::Notification;

/// A channel could not deliver.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ChannelError {
    pub message: String,
}

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Visual style of an in-app toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// A transient in-app message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn for_notification(n: &Notification) -> Self {
        Self {
            title: n.title.clone(),
            message: n.message.clone(),
            variant: ToastVariant::Default,
        }
    }
}

/// OS-level notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked.
    #[default]
    Default,
}

pub trait ToastChannel: Send + Sync {
    fn show(&self, toast: &Toast) -> Result<(), ChannelError>;
}

pub trait SoundChannel: Send + Sync {
    fn play(&self) -> Result<(), ChannelError>;
}

pub trait DesktopChannel: Send + Sync {
    fn permission(&self) -> Permission;
    fn show(&self, notification: &Notification) -> Result<(), ChannelError>;
}

/// Discards everything. Used where the host has no such surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ToastChannel for Silent {
    fn show(&self, _toast: &Toast) -> Result<(), ChannelError> {
        Ok(())
    }
}

impl SoundChannel for Silent {
    fn play(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

impl DesktopChannel for Silent {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _notification: &Notification) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// The set of delivery sinks a notification center fans out to.
#[derive(Clone)]
pub struct Channels {
    pub toast: Arc<dyn ToastChannel>,
    pub sound: Arc<dyn SoundChannel>,
    pub desktop: Arc<dyn DesktopChannel>,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            toast: Arc::new(Silent),
            sound: Arc::new(Silent),
            desktop: Arc::new(Silent),
        }
    }
}

impl Channels {
    pub fn with_toast(mut self, toast: impl ToastChannel + 'static) -> Self {
        self.toast = Arc::new(toast);
        self
    }

    pub fn with_sound(mut self, sound: impl SoundChannel + 'static) -> Self {
        self.sound = Arc::new(sound);
        self
    }

    pub fn with_desktop(mut self, desktop: impl DesktopChannel + 'static) -> Self {
        self.desktop = Arc::new(desktop);
        self
    }
}

impl fmt::Debug for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channels").finish_non_exhaustive()
    }
}

/// What happened on one channel during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelOutcome {
    Delivered,
    /// Disabled by preferences or permission.
    #[default]
    Skipped,
    Failed(String),
}

impl ChannelOutcome {
    pub(crate) fn from_result(result: Result<(), ChannelError>) -> Self {
        match result {
            Ok(()) => Self::Delivered,
            Err(e) => Self::Failed(e.message),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Per-channel outcomes for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelReport {
    pub toast: ChannelOutcome,
    pub sound: ChannelOutcome,
    pub desktop: ChannelOutcome,
}
