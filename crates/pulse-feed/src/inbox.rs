//! Bell/inbox read model
//!
//! Thin projection of the store for the bell dropdown: newest-first records
//! plus the unread badge count. Mutations go through the session, not here.

use crate::store::NotificationStore;
use pulse_model::Notification;

/// Snapshot consumed by the bell dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxView {
    /// Records, newest first
    pub items: Vec<Notification>,
    /// Count of unread records
    pub unread: usize,
}

impl InboxView {
    pub(crate) fn from_store(store: &NotificationStore) -> Self {
        let items = store.snapshot();
        let unread = items.iter().filter(|n| !n.is_read).count();
        Self { items, unread }
    }

    /// Whether there is anything to show.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_model::{NotificationId, NotificationKind};

    #[test]
    fn unread_matches_items() {
        let store = NotificationStore::new();
        store.merge(vec![
            Notification::new(
                "a",
                NotificationKind::TaskAssigned,
                "t",
                "m",
                Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            ),
            Notification::new(
                "b",
                NotificationKind::ChatMessage,
                "t",
                "m",
                Utc.with_ymd_and_hms(2026, 3, 2, 9, 5, 0).unwrap(),
            ),
        ]);
        store.confirm_read(&NotificationId::from("b"));

        let inbox = InboxView::from_store(&store);
        assert_eq!(inbox.items.len(), 2);
        assert_eq!(inbox.unread, 1);
        assert_eq!(inbox.items[0].id.as_str(), "b", "newest first");
    }
}
