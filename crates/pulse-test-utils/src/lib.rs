//! Testing utilities for the Pulseboard feed workspace
//!
//! Shared test doubles and fixtures: an in-memory collaborator API, a
//! scripted stream connector, and recording presentation sinks.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::Mutex;
use pulse_api::{ApiError, EventStream, FeedApi, StreamConnector};
use pulse_feed::{
    PermissionState, PlatformAlert, PlatformError, PlatformNotifier, Toast, ToastSink,
};
use pulse_model::{Notification, NotificationId, NotificationKind, StreamEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Initialize test-visible tracing output once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Yield to the runtime until spawned feed tasks have settled.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

pub fn notification(id: &str, kind: NotificationKind) -> Notification {
    notification_at(id, kind, Utc::now())
}

pub fn notification_at(
    id: &str,
    kind: NotificationKind,
    created_at: DateTime<Utc>,
) -> Notification {
    Notification::new(
        id,
        kind,
        format!("title {id}"),
        format!("message {id}"),
        created_at,
    )
}

/// Per-endpoint call counters for [`FakeFeedApi`].
#[derive(Debug, Default)]
pub struct CallLog {
    pub list_full: AtomicUsize,
    pub list_since: AtomicUsize,
    pub overdue: AtomicUsize,
    pub messages: AtomicUsize,
    pub mark_all_read: AtomicUsize,
    pub marked_read: Mutex<Vec<NotificationId>>,
}

/// In-memory collaborator API.
///
/// Holds the server-side notification list; `list_notifications` filters it
/// by `since`. Failure, hang, and staleness switches drive the error-path
/// and race tests.
#[derive(Debug, Default)]
pub struct FakeFeedApi {
    notifications: Mutex<Vec<Notification>>,
    overdue_counts: Mutex<VecDeque<u64>>,
    message_counts: Mutex<VecDeque<u64>>,
    fail_lists: AtomicBool,
    fail_mutations: AtomicBool,
    hang_overdue: AtomicBool,
    /// When set, read mutations succeed but the server list keeps reporting
    /// the records unread, as a stale upstream cache would.
    stale_reads: AtomicBool,
    pub calls: CallLog,
}

impl FakeFeedApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Server-side creation of a notification record.
    pub fn push_notification(&self, record: Notification) {
        self.notifications.lock().push(record);
    }

    /// Queue the result of the next overdue sweep.
    pub fn queue_overdue(&self, count: u64) {
        self.overdue_counts.lock().push_back(count);
    }

    /// Queue the result of the next message sweep.
    pub fn queue_messages(&self, count: u64) {
        self.message_counts.lock().push_back(count);
    }

    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Make the next overdue sweeps hang forever (a stuck endpoint).
    pub fn set_hang_overdue(&self, hang: bool) {
        self.hang_overdue.store(hang, Ordering::SeqCst);
    }

    pub fn set_stale_reads(&self, stale: bool) {
        self.stale_reads.store(stale, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list_full.load(Ordering::SeqCst) + self.calls.list_since.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedApi for FakeFeedApi {
    async fn list_notifications(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Notification>, ApiError> {
        match since {
            Some(_) => self.calls.list_since.fetch_add(1, Ordering::SeqCst),
            None => self.calls.list_full.fetch_add(1, Ordering::SeqCst),
        };
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 500 });
        }

        let list = self.notifications.lock().clone();
        Ok(match since {
            Some(cutoff) => list.into_iter().filter(|n| n.created_at > cutoff).collect(),
            None => list,
        })
    }

    async fn check_overdue_tasks(&self) -> Result<u64, ApiError> {
        self.calls.overdue.fetch_add(1, Ordering::SeqCst);
        if self.hang_overdue.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self.overdue_counts.lock().pop_front().unwrap_or(0))
    }

    async fn check_new_messages(&self) -> Result<u64, ApiError> {
        self.calls.messages.fetch_add(1, Ordering::SeqCst);
        Ok(self.message_counts.lock().pop_front().unwrap_or(0))
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 500 });
        }
        self.calls.marked_read.lock().push(id.clone());
        if !self.stale_reads.load(Ordering::SeqCst) {
            let mut list = self.notifications.lock();
            if let Some(record) = list.iter_mut().find(|n| &n.id == id) {
                record.is_read = true;
            }
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 500 });
        }
        self.calls.mark_all_read.fetch_add(1, Ordering::SeqCst);
        if !self.stale_reads.load(Ordering::SeqCst) {
            for record in self.notifications.lock().iter_mut() {
                record.is_read = true;
            }
        }
        Ok(())
    }
}

/// One scripted stream connection.
#[derive(Debug)]
pub enum ScriptedConnection {
    /// Refuse the connection attempt
    Refuse(ApiError),
    /// Deliver these items, then close (a server-side disconnect)
    Events(Vec<Result<StreamEvent, ApiError>>),
    /// Deliver these items, then stay open until teardown
    EventsThenIdle(Vec<Result<StreamEvent, ApiError>>),
    /// Connect and stay silent until teardown
    Idle,
}

/// Stream connector that replays a script of connections.
///
/// Once the script is exhausted, further attempts connect and idle.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<ScriptedConnection>>,
    pub connect_attempts: AtomicUsize,
}

impl ScriptedConnector {
    #[must_use]
    pub fn new(script: Vec<ScriptedConnection>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            connect_attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamConnector for ScriptedConnector {
    async fn connect(&self) -> Result<EventStream, ApiError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        match next {
            Some(ScriptedConnection::Refuse(err)) => Err(err),
            Some(ScriptedConnection::Events(events)) => {
                Ok(futures::stream::iter(events).boxed())
            }
            Some(ScriptedConnection::EventsThenIdle(events)) => Ok(futures::stream::iter(events)
                .chain(futures::stream::pending())
                .boxed()),
            Some(ScriptedConnection::Idle) | None => {
                Ok(futures::stream::pending().boxed())
            }
        }
    }
}

/// Toast sink that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingToasts {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.toasts.lock().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.toasts.lock().iter().map(|t| t.body.clone()).collect()
    }
}

impl ToastSink for RecordingToasts {
    fn toast(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}

/// Platform notifier that records alerts and answers with a settable
/// permission state.
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: Mutex<PermissionState>,
    grant_on_prompt: PermissionState,
    pub prompts: AtomicUsize,
    shown: Mutex<Vec<PlatformAlert>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_prompt: PermissionState::Granted,
            prompts: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn granted() -> Self {
        Self::with_permission(PermissionState::Granted)
    }

    #[must_use]
    pub fn denied() -> Self {
        Self::with_permission(PermissionState::Denied)
    }

    pub fn shown(&self) -> Vec<PlatformAlert> {
        self.shown.lock().clone()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().len()
    }
}

impl PlatformNotifier for RecordingNotifier {
    fn permission(&self) -> PermissionState {
        *self.permission.lock()
    }

    fn request_permission(&self) -> PermissionState {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        *self.permission.lock() = self.grant_on_prompt;
        self.grant_on_prompt
    }

    fn show(&self, alert: PlatformAlert) -> Result<(), PlatformError> {
        self.shown.lock().push(alert);
        Ok(())
    }
}
