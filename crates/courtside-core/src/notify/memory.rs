// ── In-memory notification store ──

use std::sync::Mutex;

use async_trait::async_trait;

use super::ports::NotificationRepository;
use crate::error::CoreError;
use crate::model::{Notification, NotificationDraft, NotificationPage, NotificationQuery};

/// A process-local [`NotificationRepository`], newest first.
///
/// Used when no backend store is configured and throughout the tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<Notification>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with existing records, given newest first.
    pub fn with_records(records: Vec<Notification>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn records(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.records.lock().expect("memory repository lock poisoned")
    }
}

#[async_trait]
impl NotificationRepository for MemoryRepository {
    async fn create(&self, draft: NotificationDraft) -> Result<Notification, CoreError> {
        let record = draft.into_local();
        self.lock().insert(0, record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        user_id: &str,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, CoreError> {
        let records = self.lock();
        let matching: Vec<&Notification> = records
            .iter()
            .filter(|n| n.user_id == user_id && query.matches(n))
            .collect();

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let items: Vec<Notification> = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|n| (*n).clone())
            .collect();
        let has_more = offset.saturating_add(items.len()) < matching.len();

        Ok(NotificationPage {
            items,
            total: u64::try_from(matching.len()).ok(),
            has_more,
        })
    }

    async fn mark_read(&self, id: &str) -> Result<(), CoreError> {
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "notification".into(),
                identifier: id.into(),
            })?;
        record.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<(), CoreError> {
        for record in self.lock().iter_mut().filter(|n| n.user_id == user_id) {
            record.read = true;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|n| n.id != id);
        if records.len() == before {
            return Err(CoreError::NotFound {
                entity_type: "notification".into(),
                identifier: id.into(),
            });
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), CoreError> {
        self.lock().retain(|n| n.user_id != user_id);
        Ok(())
    }

    async fn unread_count(&self, user_id: &str) -> Result<u64, CoreError> {
        let count = self
            .lock()
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
