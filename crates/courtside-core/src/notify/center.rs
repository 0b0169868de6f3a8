// ── Notification center ──
//
// Single owner of the session's notification list. `dispatch` runs the
// gate → compose → persist → record → fan-out pipeline; the remaining
// operations are the only other way the list changes.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::channels::{ChannelError, ChannelOutcome, ChannelReport, Channels, Permission, Toast};
use super::compose::Signal;
use super::ports::{NotificationRepository, PreferenceSource, StaticPreferences};
use super::state::NotificationState;
use crate::error::CoreError;
use crate::model::{
    Notification, NotificationDraft, NotificationPreferences, NotificationQuery, NotificationType,
};

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PREFERENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a signal produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SuppressReason {
    MasterDisabled,
    TypeDisabled,
}

/// Result of one [`NotificationCenter::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Gated by preferences. Nothing was stored, recorded or shown.
    Suppressed {
        kind: NotificationType,
        reason: SuppressReason,
    },
    Delivered {
        id: String,
        kind: NotificationType,
        /// `false` when the store failed, timed out or is not configured
        /// and the record only exists locally.
        persisted: bool,
        channels: ChannelReport,
    },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// One page pulled in by [`NotificationCenter::load_more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedPage {
    /// Records appended (duplicates of held ids are skipped).
    pub added: usize,
    pub has_more: bool,
}

// ── Builder ──────────────────────────────────────────────────────────

pub struct NotificationCenterBuilder {
    user_id: String,
    repository: Option<Arc<dyn NotificationRepository>>,
    preferences: Arc<dyn PreferenceSource>,
    channels: Channels,
    store_timeout: Duration,
    preference_timeout: Duration,
}

impl NotificationCenterBuilder {
    /// Store to mirror notifications into. Without one, records are
    /// local-only.
    pub fn repository(mut self, repository: Arc<dyn NotificationRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn preferences(mut self, preferences: Arc<dyn PreferenceSource>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn preference_timeout(mut self, timeout: Duration) -> Self {
        self.preference_timeout = timeout;
        self
    }

    pub fn build(self) -> NotificationCenter {
        let (state, _) = watch::channel(NotificationState::default());
        NotificationCenter {
            inner: Arc::new(CenterInner {
                user_id: self.user_id,
                repository: self.repository,
                preferences: self.preferences,
                channels: self.channels,
                store_timeout: self.store_timeout,
                preference_timeout: self.preference_timeout,
                state,
            }),
        }
    }
}

// ── NotificationCenter ───────────────────────────────────────────────

struct CenterInner {
    user_id: String,
    repository: Option<Arc<dyn NotificationRepository>>,
    preferences: Arc<dyn PreferenceSource>,
    channels: Channels,
    store_timeout: Duration,
    preference_timeout: Duration,
    state: watch::Sender<NotificationState>,
}

/// Process-wide notification list, unread counter and dispatch pipeline.
///
/// Cheaply cloneable; clones share one state.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

impl NotificationCenter {
    pub fn builder(user_id: impl Into<String>) -> NotificationCenterBuilder {
        NotificationCenterBuilder {
            user_id: user_id.into(),
            repository: None,
            preferences: Arc::new(StaticPreferences::default()),
            channels: Channels::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            preference_timeout: DEFAULT_PREFERENCE_TIMEOUT,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    // ── Observables ──────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.inner.state.subscribe()
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Arc<Notification>> {
        self.inner.state.borrow().items().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.state.borrow().unread()
    }

    pub fn snapshot(&self) -> NotificationState {
        self.inner.state.borrow().clone()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Turn a domain event or system notice into a notification.
    ///
    /// Never fails: preference and store problems degrade to defaults and
    /// local records, channel failures are reported per channel.
    pub async fn dispatch(&self, signal: impl Into<Signal>) -> DispatchOutcome {
        let signal = signal.into();
        let kind = signal.notification_type();
        let prefs = self.preferences().await;

        if !prefs.master_enabled {
            debug!(%kind, "notifications disabled, suppressing");
            return DispatchOutcome::Suppressed {
                kind,
                reason: SuppressReason::MasterDisabled,
            };
        }
        if !prefs.types.is_enabled(kind) {
            debug!(%kind, "notification type disabled, suppressing");
            return DispatchOutcome::Suppressed {
                kind,
                reason: SuppressReason::TypeDisabled,
            };
        }

        let draft = signal.compose(&self.inner.user_id);
        let (notification, persisted) = self.persist(draft).await;
        let id = notification.id.clone();

        let mut toast = Toast::for_notification(&notification);
        toast.variant = signal.toast_variant();
        let shown = notification.clone();

        self.inner.state.send_modify(|state| state.push_front(notification));

        let channels = self.fan_out(&shown, &toast, prefs);
        debug!(%id, %kind, persisted, "notification dispatched");

        DispatchOutcome::Delivered {
            id,
            kind,
            persisted,
            channels,
        }
    }

    /// Current preferences, or the permissive default when the source
    /// fails or is slow.
    pub async fn preferences(&self) -> NotificationPreferences {
        let lookup = self.inner.preferences.preferences(&self.inner.user_id);
        match tokio::time::timeout(self.inner.preference_timeout, lookup).await {
            Ok(Ok(prefs)) => prefs,
            Ok(Err(e)) => {
                warn!(error = %e, "preferences unavailable, using defaults");
                NotificationPreferences::default()
            }
            Err(_) => {
                warn!(
                    timeout_ms = duration_ms(self.inner.preference_timeout),
                    "preference lookup timed out, using defaults"
                );
                NotificationPreferences::default()
            }
        }
    }

    async fn persist(&self, draft: NotificationDraft) -> (Notification, bool) {
        let Some(repository) = &self.inner.repository else {
            return (draft.into_local(), false);
        };

        match self.with_timeout(repository.create(draft.clone())).await {
            Ok(stored) => (stored, true),
            Err(e) => {
                warn!(error = %e, "failed to persist notification, keeping local copy");
                (draft.into_local(), false)
            }
        }
    }

    fn fan_out(
        &self,
        notification: &Notification,
        toast: &Toast,
        prefs: NotificationPreferences,
    ) -> ChannelReport {
        let channels = &self.inner.channels;

        ChannelReport {
            toast: deliver("toast", || channels.toast.show(toast)),
            sound: if prefs.sound {
                deliver("sound", || channels.sound.play())
            } else {
                ChannelOutcome::Skipped
            },
            // Permission is never requested from here; `Default` means
            // "not asked yet" and counts as a denial.
            desktop: if prefs.desktop && channels.desktop.permission() == Permission::Granted {
                deliver("desktop", || channels.desktop.show(notification))
            } else {
                ChannelOutcome::Skipped
            },
        }
    }

    // ── List operations ──────────────────────────────────────────────

    /// Returns `true` if the notification flipped to read.
    pub async fn mark_as_read(&self, id: &str) -> bool {
        let flipped = self.inner.state.send_if_modified(|state| state.mark_read(id));
        if flipped {
            if let Some(repository) = &self.inner.repository {
                self.best_effort("mark_read", repository.mark_read(id)).await;
            }
        }
        flipped
    }

    /// Returns how many notifications flipped.
    pub async fn mark_all_as_read(&self) -> usize {
        let mut flipped = 0;
        self.inner.state.send_if_modified(|state| {
            flipped = state.mark_all_read();
            flipped > 0
        });
        if flipped > 0 {
            if let Some(repository) = &self.inner.repository {
                self.best_effort("mark_all_read", repository.mark_all_read(&self.inner.user_id))
                    .await;
            }
        }
        flipped
    }

    /// Returns `true` if the notification was held.
    pub async fn delete(&self, id: &str) -> bool {
        let removed = self
            .inner
            .state
            .send_if_modified(|state| state.remove(id).is_some());
        if let Some(repository) = &self.inner.repository {
            self.best_effort("delete", repository.delete(id)).await;
        }
        removed
    }

    pub async fn clear_all(&self) {
        self.inner.state.send_modify(NotificationState::clear);
        if let Some(repository) = &self.inner.repository {
            self.best_effort("delete_all", repository.delete_all(&self.inner.user_id))
                .await;
        }
    }

    /// Fetch an older page and append it behind everything held.
    pub async fn load_more(&self, query: &NotificationQuery) -> Result<LoadedPage, CoreError> {
        let Some(repository) = &self.inner.repository else {
            return Ok(LoadedPage {
                added: 0,
                has_more: false,
            });
        };

        let page = self
            .with_timeout(repository.list(&self.inner.user_id, query))
            .await?;
        let has_more = page.has_more;

        let mut added = 0;
        self.inner.state.send_if_modified(|state| {
            added = state.append_page(page.items);
            added > 0
        });
        debug!(added, has_more, offset = query.offset, "loaded notification page");

        Ok(LoadedPage { added, has_more })
    }

    /// Replace the list with the newest `limit` stored notifications.
    pub async fn reload(&self, limit: u32) -> Result<LoadedPage, CoreError> {
        let Some(repository) = &self.inner.repository else {
            return Ok(LoadedPage {
                added: 0,
                has_more: false,
            });
        };

        let query = NotificationQuery::page(limit, 0);
        let page = self
            .with_timeout(repository.list(&self.inner.user_id, &query))
            .await?;
        let has_more = page.has_more;
        let mut added = 0;
        self.inner.state.send_modify(|state| {
            state.replace(page.items);
            added = state.len();
        });

        Ok(LoadedPage { added, has_more })
    }

    /// Unread count according to the store, for reconciliation. Falls
    /// back to the local count without a store.
    pub async fn remote_unread_count(&self) -> Result<u64, CoreError> {
        match &self.inner.repository {
            Some(repository) => {
                self.with_timeout(repository.unread_count(&self.inner.user_id))
                    .await
            }
            None => Ok(u64::try_from(self.unread_count()).unwrap_or(u64::MAX)),
        }
    }

    /// Sign-out: drop everything held in memory. The store is untouched.
    pub fn reset(&self) {
        self.inner.state.send_modify(NotificationState::clear);
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        tokio::time::timeout(self.inner.store_timeout, call)
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: self.inner.store_timeout.as_secs(),
            })?
    }

    async fn best_effort(&self, op: &'static str, call: impl Future<Output = Result<(), CoreError>>) {
        if let Err(e) = self.with_timeout(call).await {
            warn!(op, error = %e, "notification store update failed");
        }
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("user_id", &self.inner.user_id)
            .field("persistent", &self.inner.repository.is_some())
            .finish_non_exhaustive()
    }
}

fn deliver(channel: &'static str, send: impl FnOnce() -> Result<(), ChannelError>) -> ChannelOutcome {
    let result = catch_unwind(AssertUnwindSafe(send))
        .unwrap_or_else(|_| Err(ChannelError::new("channel panicked")));
    if let Err(e) = &result {
        warn!(channel, error = %e, "notification channel failed");
    }
    ChannelOutcome::from_result(result)
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
