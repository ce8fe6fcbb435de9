//! Feed session lifecycle
//!
//! Every timer and the stream connection are owned by one session object:
//! acquired in [`FeedSession::start`], released by [`FeedSession::shutdown`]
//! (or aborted on drop). Nothing here is ambient module state, so a logout
//! cannot leave a timer firing against a stale session.

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::inbox::InboxView;
use crate::poller::PollingChecker;
use crate::presenter::{DeliveryPresenter, PermissionState, PlatformNotifier, Toast, ToastSink};
use crate::store::{Invalidator, NotificationStore};
use crate::stream::{StreamReceiver, StreamState, StreamStateHandle};
use pulse_api::{FeedApi, StreamConnector};
use pulse_model::NotificationId;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One authenticated user's feed: store, channels, timers, presentation.
pub struct FeedSession {
    api: Arc<dyn FeedApi>,
    store: Arc<NotificationStore>,
    presenter: Arc<DeliveryPresenter>,
    toasts: Arc<dyn ToastSink>,
    invalidator: Invalidator,
    stream_state: StreamStateHandle,
    config: FeedConfig,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeedSession {
    /// Acquire the session's resources: three poll timers, the stream
    /// connection, and the refresh loop.
    #[must_use]
    pub fn start(
        api: Arc<dyn FeedApi>,
        connector: Arc<dyn StreamConnector>,
        toasts: Arc<dyn ToastSink>,
        platform: Arc<dyn PlatformNotifier>,
        config: FeedConfig,
    ) -> Self {
        let store = Arc::new(NotificationStore::new());
        let presenter = Arc::new(DeliveryPresenter::new(
            toasts.clone(),
            platform,
            config.toast_duration,
        ));
        let invalidator = Invalidator::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = PollingChecker::new(
            api.clone(),
            store.clone(),
            presenter.clone(),
            invalidator.clone(),
            config.clone(),
        )
        .spawn(&shutdown_rx);

        let receiver = Arc::new(StreamReceiver::new(
            connector,
            store.clone(),
            presenter.clone(),
            invalidator.clone(),
            config.reconnect_delay,
        ));
        let stream_state = receiver.state_handle();
        tasks.push(tokio::spawn(receiver.run(shutdown_rx.clone())));

        tasks.push(tokio::spawn(refresh_loop(
            api.clone(),
            store.clone(),
            invalidator.clone(),
            config.clone(),
            shutdown_rx,
        )));

        tracing::info!("feed session started");
        Self {
            api,
            store,
            presenter,
            toasts,
            invalidator,
            stream_state,
            config,
            shutdown: shutdown_tx,
            tasks,
        }
    }

    /// Current inbox snapshot for the bell view.
    #[must_use]
    pub fn inbox(&self) -> InboxView {
        InboxView::from_store(&self.store)
    }

    /// Count of unread records, for the bell badge.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// The shared store, for read-model composition.
    #[must_use]
    pub fn store(&self) -> Arc<NotificationStore> {
        self.store.clone()
    }

    /// Current push-channel state.
    #[must_use]
    pub fn stream_state(&self) -> StreamState {
        self.stream_state.get()
    }

    /// Mark one notification read.
    ///
    /// Local state flips only after the collaborator confirms. On failure
    /// the user gets an actionable error toast and the unread badge stays
    /// honest.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), FeedError> {
        match self.api.mark_read(id).await {
            Ok(()) => {
                self.store.confirm_read(id);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%id, "mark-read failed: {err}");
                self.mutation_failed_toast("Couldn't mark the notification as read.");
                Err(err.into())
            }
        }
    }

    /// Mark every notification read. Same contract as [`Self::mark_read`].
    pub async fn mark_all_read(&self) -> Result<(), FeedError> {
        match self.api.mark_all_read().await {
            Ok(()) => {
                self.store.confirm_all_read();
                Ok(())
            }
            Err(err) => {
                tracing::warn!("mark-all-read failed: {err}");
                self.mutation_failed_toast("Couldn't mark notifications as read.");
                Err(err.into())
            }
        }
    }

    /// Explicit opt-in for OS-level alerts; the only path that may prompt.
    pub fn request_platform_permission(&self) -> PermissionState {
        self.presenter.request_permission()
    }

    /// Ask the refresh loop for a refetch (coalesced while the store is
    /// fresh).
    pub fn invalidate(&self) {
        self.invalidator.notify();
    }

    /// Release every timer and the stream connection.
    ///
    /// After this returns, no tick or stream message produces any further
    /// side effect.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    tracing::warn!("feed task ended abnormally: {err}");
                }
            }
        }
        tracing::info!("feed session shut down");
    }

    fn mutation_failed_toast(&self, body: &str) {
        self.toasts.toast(Toast {
            title: "Notification update failed".to_string(),
            body: format!("{body} Please try again."),
            severity: pulse_model::Severity::Error,
            auto_dismiss: Some(self.config.toast_duration),
        });
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        // Last-resort release for sessions dropped without shutdown().
        let _ = self.shutdown.send(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("records", &self.store.len())
            .field("stream_state", &self.stream_state.get())
            .finish_non_exhaustive()
    }
}

/// Owns the store's authoritative refetch: a fixed cadence plus coalesced
/// invalidation wakeups from either delivery channel.
async fn refresh_loop(
    api: Arc<dyn FeedApi>,
    store: Arc<NotificationStore>,
    invalidator: Invalidator,
    config: FeedConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    // Initial authoritative fill so the bell has data at login.
    if refetch(api.as_ref(), &store, &mut shutdown).await {
        return;
    }

    let mut interval = tokio::time::interval(config.refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
            () = invalidator.invalidated() => {
                if store.is_fresh(config.staleness_window) {
                    tracing::debug!("refetch coalesced, store is fresh");
                    continue;
                }
            }
        }
        if refetch(api.as_ref(), &store, &mut shutdown).await {
            break;
        }
    }
}

/// Returns true when the shutdown signal interrupted the fetch.
async fn refetch(
    api: &dyn FeedApi,
    store: &NotificationStore,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let result = tokio::select! {
        _ = shutdown.changed() => return true,
        result = api.list_notifications(None) => result,
    };

    match result {
        Ok(records) => {
            store.apply_refetch(records);
            tracing::debug!(count = store.len(), "store refetched");
        }
        Err(err) => {
            tracing::warn!("store refetch failed: {err}");
        }
    }
    false
}
