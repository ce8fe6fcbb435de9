//! Client-side notification cache
//!
//! Both delivery channels merge into this store, and the refresh loop
//! replaces it wholesale from the authoritative list. Read-state is
//! monotonic within a session: once the collaborator confirms a read, no
//! stale fetch racing in can flip the record back to unread.

use dashmap::DashMap;
use parking_lot::Mutex;
use pulse_model::{Notification, NotificationId};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Id-keyed cache of every notification observed this session.
#[derive(Debug, Default)]
pub struct NotificationStore {
    records: DashMap<NotificationId, Notification>,
    /// Ids whose read state the collaborator has acknowledged this session.
    /// Fetched data never downgrades these back to unread.
    confirmed_read: Mutex<HashSet<NotificationId>>,
    last_refresh: Mutex<Option<Instant>>,
}

impl NotificationStore {
    /// Create an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Union-merge a partial fetch (a `since` window or a pushed record).
    ///
    /// Returns the records that were previously unknown; callers present
    /// exactly those. Known records are replaced whole, never field-patched.
    pub fn merge(&self, records: Vec<Notification>) -> Vec<Notification> {
        let confirmed = self.confirmed_read.lock();
        let mut fresh = Vec::new();

        for mut record in records {
            if confirmed.contains(&record.id) {
                record.is_read = true;
            }
            let previously_known = self.records.contains_key(&record.id);
            self.records.insert(record.id.clone(), record.clone());
            if !previously_known {
                fresh.push(record);
            }
        }
        fresh
    }

    /// Replace the collection from the authoritative full list.
    ///
    /// The server is the source of truth for completeness; the confirmed-read
    /// overlay keeps read-state monotonic across stale responses.
    pub fn apply_refetch(&self, records: Vec<Notification>) {
        let confirmed = self.confirmed_read.lock();

        self.records.clear();
        for mut record in records {
            if confirmed.contains(&record.id) {
                record.is_read = true;
            }
            self.records.insert(record.id.clone(), record);
        }
        drop(confirmed);

        self.mark_refreshed();
    }

    /// Record a server-acknowledged read for one id.
    pub fn confirm_read(&self, id: &NotificationId) {
        self.confirmed_read.lock().insert(id.clone());
        if let Some(mut record) = self.records.get_mut(id) {
            record.is_read = true;
        }
    }

    /// Record a server-acknowledged read for every known id.
    pub fn confirm_all_read(&self) {
        let mut confirmed = self.confirmed_read.lock();
        for mut entry in self.records.iter_mut() {
            entry.is_read = true;
            confirmed.insert(entry.key().clone());
        }
    }

    /// Current records, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        let mut records: Vec<Notification> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// One record by id.
    #[must_use]
    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Count of unread records.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|entry| !entry.is_read).count()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stamp the store as freshly refetched.
    pub fn mark_refreshed(&self) {
        *self.last_refresh.lock() = Some(Instant::now());
    }

    /// Whether the last refetch is younger than `window`.
    #[must_use]
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.last_refresh
            .lock()
            .is_some_and(|at| at.elapsed() < window)
    }
}

/// Shared refetch trigger.
///
/// Both channels signal it instead of refetching themselves; the refresh
/// loop owns the actual fetch and coalesces bursts through the store's
/// freshness stamp.
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    inner: Arc<Notify>,
}

impl Invalidator {
    /// Create a trigger with no pending signal.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a refetch. Signals coalesce; many calls wake one refetch.
    pub fn notify(&self) {
        self.inner.notify_one();
    }

    /// Wait for the next refetch request.
    pub async fn invalidated(&self) {
        self.inner.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use pulse_model::NotificationKind;

    fn record(id: &str, minute: u32) -> Notification {
        Notification::new(
            id,
            NotificationKind::TaskAssigned,
            "title",
            "message",
            Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).unwrap(),
        )
    }

    #[test]
    fn merge_reports_only_unknown_records() {
        let store = NotificationStore::new();

        let fresh = store.merge(vec![record("a", 1), record("b", 2)]);
        assert_eq!(fresh.len(), 2);

        // Same window again: nothing new
        let fresh = store.merge(vec![record("a", 1), record("b", 2), record("c", 3)]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id.as_str(), "c");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn confirmed_read_survives_stale_merge() {
        let store = NotificationStore::new();
        store.merge(vec![record("a", 1)]);

        store.confirm_read(&NotificationId::from("a"));
        assert_eq!(store.unread_count(), 0);

        // A stale fetch still claims "a" is unread
        store.merge(vec![record("a", 1)]);
        assert_eq!(store.unread_count(), 0, "read flag must not regress");
    }

    #[test]
    fn confirmed_read_survives_full_refetch() {
        let store = NotificationStore::new();
        store.merge(vec![record("a", 1), record("b", 2)]);
        store.confirm_all_read();

        store.apply_refetch(vec![record("a", 1), record("b", 2), record("c", 3)]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.unread_count(), 1, "only the new record is unread");
        assert!(store.get(&NotificationId::from("a")).unwrap().is_read);
    }

    #[test]
    fn refetch_drops_records_the_server_no_longer_reports() {
        let store = NotificationStore::new();
        store.merge(vec![record("a", 1), record("b", 2)]);

        store.apply_refetch(vec![record("b", 2)]);

        assert_eq!(store.len(), 1);
        assert!(store.get(&NotificationId::from("a")).is_none());
    }

    #[test]
    fn snapshot_is_newest_first() {
        let store = NotificationStore::new();
        store.merge(vec![record("old", 1), record("new", 30), record("mid", 15)]);

        let snapshot = store.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_expires_with_time() {
        let store = NotificationStore::new();
        assert!(!store.is_fresh(Duration::from_secs(5)));

        store.mark_refreshed();
        assert!(store.is_fresh(Duration::from_secs(5)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!store.is_fresh(Duration::from_secs(5)));
    }
}
