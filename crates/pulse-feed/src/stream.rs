//! Streaming receiver
//!
//! The push half of the dual-channel design: a long-lived one-way connection
//! delivering records as they are created. Stream failures are non-fatal to
//! the rest of the feed; the polling checker keeps delivering while the
//! receiver backs off and reconnects.

use crate::presenter::DeliveryPresenter;
use crate::store::{Invalidator, NotificationStore};
use parking_lot::Mutex;
use pulse_api::{ApiError, EventStream, StreamConnector};
use pulse_model::StreamEvent;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No connection, none in progress
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Receiving events
    Connected,
}

/// Legal successor states.
#[must_use]
pub fn allowed_transitions(from: StreamState) -> &'static [StreamState] {
    use StreamState::*;
    match from {
        Disconnected => &[Connecting],
        Connecting => &[Connected, Disconnected],
        Connected => &[Disconnected],
    }
}

/// Observable handle onto the receiver's current state.
#[derive(Debug, Clone, Default)]
pub struct StreamStateHandle {
    inner: Arc<Mutex<StreamState>>,
}

impl Default for StreamState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl StreamStateHandle {
    /// Current state.
    #[must_use]
    pub fn get(&self) -> StreamState {
        *self.inner.lock()
    }

    fn transition(&self, to: StreamState) {
        let mut state = self.inner.lock();
        debug_assert!(
            allowed_transitions(*state).contains(&to),
            "illegal stream transition {:?} -> {to:?}",
            *state,
        );
        tracing::debug!(from = ?*state, to = ?to, "stream state");
        *state = to;
    }
}

pub(crate) struct StreamReceiver {
    connector: Arc<dyn StreamConnector>,
    store: Arc<NotificationStore>,
    presenter: Arc<DeliveryPresenter>,
    invalidator: Invalidator,
    reconnect_delay: Duration,
    state: StreamStateHandle,
}

impl StreamReceiver {
    pub(crate) fn new(
        connector: Arc<dyn StreamConnector>,
        store: Arc<NotificationStore>,
        presenter: Arc<DeliveryPresenter>,
        invalidator: Invalidator,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            connector,
            store,
            presenter,
            invalidator,
            reconnect_delay,
            state: StreamStateHandle::default(),
        }
    }

    pub(crate) fn state_handle(&self) -> StreamStateHandle {
        self.state.clone()
    }

    /// Connect, drain, back off, and reconnect until shutdown.
    ///
    /// The backoff sleep at the bottom of the loop is the reconnect timer;
    /// because the loop runs it inline, there is never more than one pending
    /// reconnect, and a fresh error simply restarts the single delay.
    pub(crate) async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            self.state.transition(StreamState::Connecting);
            let attempt = tokio::select! {
                _ = shutdown.changed() => {
                    self.state.transition(StreamState::Disconnected);
                    break;
                }
                attempt = self.connector.connect() => attempt,
            };
            match attempt {
                Ok(stream) => {
                    self.state.transition(StreamState::Connected);
                    tracing::info!("event stream connected");
                    let stopped = self.drain(stream, &mut shutdown).await;
                    self.state.transition(StreamState::Disconnected);
                    if stopped {
                        break;
                    }
                }
                Err(err @ ApiError::MissingToken) => {
                    // Hard precondition: no session token, nothing to
                    // reconnect against.
                    self.state.transition(StreamState::Disconnected);
                    tracing::error!("cannot open event stream: {err}");
                    break;
                }
                Err(err) => {
                    self.state.transition(StreamState::Disconnected);
                    tracing::warn!("event stream connect failed: {err}");
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    /// Returns true when the shutdown signal ended the drain.
    async fn drain(&self, mut stream: EventStream, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return true,
                event = stream.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(err)) => {
                        tracing::warn!("event stream error: {err}");
                        return false;
                    }
                    None => {
                        tracing::info!("event stream closed by server");
                        return false;
                    }
                },
            }
        }
    }

    fn handle_event(&self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => tracing::debug!("stream handshake acknowledged"),
            StreamEvent::Heartbeat => tracing::trace!("stream heartbeat"),
            StreamEvent::Notification { notification } => {
                tracing::debug!(id = %notification.id, "notification via stream");
                self.presenter.deliver(&notification);
                self.store.merge(vec![notification]);
                self.invalidator.notify();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_a_cycle() {
        assert_eq!(
            allowed_transitions(StreamState::Disconnected),
            &[StreamState::Connecting]
        );
        assert!(allowed_transitions(StreamState::Connecting).contains(&StreamState::Connected));
        assert!(allowed_transitions(StreamState::Connecting).contains(&StreamState::Disconnected));
        assert_eq!(
            allowed_transitions(StreamState::Connected),
            &[StreamState::Disconnected]
        );
    }

    #[test]
    fn state_handle_starts_disconnected() {
        let handle = StreamStateHandle::default();
        assert_eq!(handle.get(), StreamState::Disconnected);
    }
}
