// ── In-memory notification state ──
//
// The list and its unread counter change together or not at all. Every
// mutator below keeps `unread == items.filter(!read).count()`.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::model::Notification;

/// Newest-first notification list plus unread counter.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    items: VecDeque<Arc<Notification>>,
    unread: usize,
}

impl NotificationState {
    pub fn items(&self) -> impl ExactSizeIterator<Item = &Arc<Notification>> {
        self.items.iter()
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Notification>> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Insert at the head. An entry with the same id is replaced, so a
    /// record that also arrived in a reloaded page is listed once.
    pub(crate) fn push_front(&mut self, notification: Notification) {
        self.remove(&notification.id);
        if !notification.read {
            self.unread += 1;
        }
        self.items.push_front(Arc::new(notification));
    }

    /// Append a page at the tail, skipping ids already held. Returns how
    /// many were added.
    pub(crate) fn append_page(&mut self, page: Vec<Notification>) -> usize {
        let mut seen: HashSet<String> = self.items.iter().map(|n| n.id.clone()).collect();
        let mut added = 0;
        for notification in page {
            if !seen.insert(notification.id.clone()) {
                continue;
            }
            if !notification.read {
                self.unread += 1;
            }
            self.items.push_back(Arc::new(notification));
            added += 1;
        }
        added
    }

    /// Returns `true` if the item flipped from unread to read.
    pub(crate) fn mark_read(&mut self, id: &str) -> bool {
        let Some(slot) = self.items.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if slot.read {
            return false;
        }
        Arc::make_mut(slot).read = true;
        self.unread -= 1;
        true
    }

    /// Returns how many items flipped.
    pub(crate) fn mark_all_read(&mut self) -> usize {
        let flipped = self.unread;
        if flipped == 0 {
            return 0;
        }
        for slot in &mut self.items {
            if !slot.read {
                Arc::make_mut(slot).read = true;
            }
        }
        self.unread = 0;
        flipped
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Arc<Notification>> {
        let index = self.items.iter().position(|n| n.id == id)?;
        let removed = self.items.remove(index)?;
        if !removed.read {
            self.unread -= 1;
        }
        Some(removed)
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.unread = 0;
    }

    /// Replace everything with a fresh first page.
    pub(crate) fn replace(&mut self, page: Vec<Notification>) {
        self.clear();
        self.append_page(page);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::NotificationType;
    use chrono::Utc;
    use proptest::prelude::*;

    fn note(id: &str, read: bool) -> Notification {
        Notification {
            id: id.into(),
            user_id: "u1".into(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationType::Info,
            read,
            created_at: Utc::now(),
            url: None,
            data: None,
        }
    }

    fn invariant_holds(state: &NotificationState) -> bool {
        state.unread() == state.items().filter(|n| !n.read).count()
    }

    #[test]
    fn mark_read_decrements_once() {
        let mut state = NotificationState::default();
        state.push_front(note("a", false));
        state.push_front(note("b", false));

        assert!(state.mark_read("a"));
        assert!(!state.mark_read("a"));
        assert!(!state.mark_read("missing"));
        assert_eq!(state.unread(), 1);
    }

    #[test]
    fn delete_only_counts_unread() {
        let mut state = NotificationState::default();
        state.push_front(note("a", true));
        state.push_front(note("b", false));

        state.remove("a");
        assert_eq!(state.unread(), 1);
        state.remove("b");
        assert_eq!(state.unread(), 0);
        assert!(state.remove("b").is_none());
    }

    #[test]
    fn page_appends_behind_pushed_items_without_duplicates() {
        let mut state = NotificationState::default();
        state.push_front(note("old-1", false));
        state.push_front(note("new", false));

        let added = state.append_page(vec![note("old-1", false), note("old-2", true)]);
        assert_eq!(added, 1);

        let ids: Vec<&str> = state.items().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["new", "old-1", "old-2"]);
        assert_eq!(state.unread(), 2);
    }

    #[test]
    fn push_replaces_a_record_already_loaded() {
        let mut state = NotificationState::default();
        state.replace(vec![note("fresh", false), note("older", false)]);

        state.push_front(note("fresh", false));
        let ids: Vec<&str> = state.items().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["fresh", "older"]);
        assert_eq!(state.unread(), 2);

        state.push_front(note("older", true));
        let ids: Vec<&str> = state.items().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["older", "fresh"]);
        assert_eq!(state.unread(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(bool),
        Repush(usize, bool),
        MarkRead(usize),
        MarkAll,
        Remove(usize),
        Clear,
        Page(Vec<bool>),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => any::<bool>().prop_map(Op::Push),
            2 => ((0usize..12), any::<bool>()).prop_map(|(i, read)| Op::Repush(i, read)),
            3 => (0usize..12).prop_map(Op::MarkRead),
            1 => Just(Op::MarkAll),
            3 => (0usize..12).prop_map(Op::Remove),
            1 => Just(Op::Clear),
            2 => prop::collection::vec(any::<bool>(), 0..4).prop_map(Op::Page),
        ]
    }

    proptest! {
        #[test]
        fn unread_counter_matches_list(ops in prop::collection::vec(op(), 0..60)) {
            let mut state = NotificationState::default();
            let mut next = 0u32;
            let mut fresh = |read: bool| {
                next += 1;
                note(&format!("n{next}"), read)
            };

            for op in ops {
                match op {
                    Op::Push(read) => state.push_front(fresh(read)),
                    Op::Repush(i, read) => {
                        let id = state.items().nth(i).map(|n| n.id.clone());
                        if let Some(id) = id {
                            let before = state.len();
                            state.push_front(note(&id, read));
                            prop_assert_eq!(state.len(), before);
                        }
                    }
                    Op::MarkRead(i) => {
                        let id = state.items().nth(i).map(|n| n.id.clone());
                        if let Some(id) = id {
                            state.mark_read(&id);
                        }
                    }
                    Op::MarkAll => {
                        state.mark_all_read();
                    }
                    Op::Remove(i) => {
                        let id = state.items().nth(i).map(|n| n.id.clone());
                        if let Some(id) = id {
                            state.remove(&id);
                        }
                    }
                    Op::Clear => state.clear(),
                    Op::Page(reads) => {
                        let page = reads.into_iter().map(&mut fresh).collect();
                        state.append_page(page);
                    }
                }
                prop_assert!(invariant_holds(&state));
            }
        }
    }
}
