//! Push-channel wire events
//!
//! The collaborator's event endpoint emits newline-delimited JSON objects,
//! tagged by `type`. Handshake and keep-alive events carry no payload; only
//! `notification` events carry a record.

use crate::notification::Notification;
use serde::{Deserialize, Serialize};

/// One event on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Handshake acknowledgement sent once per connection
    Connected,
    /// Keep-alive; proves the connection is live
    Heartbeat,
    /// A notification record, pushed as it is created
    Notification {
        /// The pushed record
        notification: Notification,
    },
}

impl StreamEvent {
    /// Events that prove liveness but deliver nothing.
    #[inline]
    #[must_use]
    pub fn is_keepalive(&self) -> bool {
        matches!(self, Self::Connected | Self::Heartbeat)
    }

    /// Extract the pushed record, if any.
    #[inline]
    #[must_use]
    pub fn into_notification(self) -> Option<Notification> {
        match self {
            Self::Notification { notification } => Some(notification),
            _ => None,
        }
    }
}
