//! Polling checkers
//!
//! The pull half of the dual-channel design: three questions, three
//! independent timers. The notification poll is the guaranteed-eventual
//! delivery path while the stream is down; the two sweeps ask the server to
//! materialize records for newly-overdue tasks and unread chat messages.
//! A hung or failing endpoint only ever delays its own cadence, and the
//! shutdown signal cancels a request still in flight.

use crate::config::FeedConfig;
use crate::presenter::{DeliveryPresenter, SweepKind};
use crate::store::{Invalidator, NotificationStore};
use chrono::{DateTime, Utc};
use pulse_api::FeedApi;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub(crate) struct PollingChecker {
    api: Arc<dyn FeedApi>,
    store: Arc<NotificationStore>,
    presenter: Arc<DeliveryPresenter>,
    invalidator: Invalidator,
    config: FeedConfig,
}

impl PollingChecker {
    pub(crate) fn new(
        api: Arc<dyn FeedApi>,
        store: Arc<NotificationStore>,
        presenter: Arc<DeliveryPresenter>,
        invalidator: Invalidator,
        config: FeedConfig,
    ) -> Self {
        Self {
            api,
            store,
            presenter,
            invalidator,
            config,
        }
    }

    /// Spawn the three poll loops. Each owns its own timer and exits on the
    /// shutdown signal.
    pub(crate) fn spawn(self, shutdown: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let checker = Arc::new(self);
        vec![
            tokio::spawn(Self::notification_loop(checker.clone(), shutdown.clone())),
            tokio::spawn(Self::sweep_loop(
                checker.clone(),
                SweepKind::OverdueTasks,
                shutdown.clone(),
            )),
            tokio::spawn(Self::sweep_loop(
                checker,
                SweepKind::NewMessages,
                shutdown.clone(),
            )),
        ]
    }

    async fn notification_loop(this: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(this.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        // Records created before the session started are the refresh loop's
        // business; polling only presents what arrives afterwards.
        let mut high_water = Utc::now();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                () = this.poll_notifications(&mut high_water) => {}
            }
        }
    }

    async fn sweep_loop(this: Arc<Self>, sweep: SweepKind, mut shutdown: watch::Receiver<bool>) {
        let period = match sweep {
            SweepKind::OverdueTasks => this.config.overdue_sweep_interval,
            SweepKind::NewMessages => this.config.message_sweep_interval,
        };
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                () = this.run_sweep(sweep) => {}
            }
        }
    }

    async fn poll_notifications(&self, high_water: &mut DateTime<Utc>) {
        // Captured before the request: records created mid-flight land in
        // the next window instead of being skipped.
        let request_at = Utc::now();

        match self.api.list_notifications(Some(*high_water)).await {
            Ok(records) => {
                let fresh = self.store.merge(records);
                for record in &fresh {
                    self.presenter.deliver(record);
                }
                *high_water = request_at;
                if !fresh.is_empty() {
                    tracing::debug!(count = fresh.len(), "new notifications via poll");
                }
            }
            Err(err) => {
                // Keep the mark; the next tick retries the same window.
                tracing::warn!("notification poll failed: {err}");
            }
        }
    }

    async fn run_sweep(&self, sweep: SweepKind) {
        let result = match sweep {
            SweepKind::OverdueTasks => self.api.check_overdue_tasks().await,
            SweepKind::NewMessages => self.api.check_new_messages().await,
        };

        match result {
            Ok(0) => {}
            Ok(count) => {
                tracing::info!(?sweep, count, "sweep materialized notifications");
                self.presenter.deliver_aggregate(sweep, count);
                self.invalidator.notify();
            }
            Err(err) => {
                tracing::warn!(?sweep, "sweep failed: {err}");
            }
        }
    }
}
