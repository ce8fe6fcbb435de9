//! Pulseboard feed engine
//!
//! The client-side notification delivery and reconciliation mechanism:
//! - A push channel (event stream) for low-latency delivery
//! - A pull channel (three independent poll timers) for guaranteed eventual
//!   delivery while the stream is down
//! - One id-keyed store both channels reconcile into
//! - A presenter that fires each record's side effects at most once,
//!   whichever channel observed it first
//! - A session object that owns every timer and connection, released on
//!   logout
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_api::{HttpFeedApi, HttpStreamConnector, TokenStore};
//! use pulse_feed::{FeedConfig, FeedSession};
//! use std::sync::Arc;
//!
//! # async fn example(toasts: Arc<dyn pulse_feed::ToastSink>, platform: Arc<dyn pulse_feed::PlatformNotifier>) {
//! let tokens = TokenStore::with_token("bearer-token");
//! let api = Arc::new(HttpFeedApi::new("https://pulse.example.com/api", tokens.clone()));
//! let connector = Arc::new(HttpStreamConnector::new("https://pulse.example.com/api", tokens));
//!
//! let session = FeedSession::start(api, connector, toasts, platform, FeedConfig::new());
//! // ... user works; the bell reads session.inbox() ...
//! session.shutdown().await; // logout
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod inbox;
pub mod presenter;
pub mod session;
pub mod store;
pub mod stream;

mod poller;

// Re-exports for convenience
pub use config::FeedConfig;
pub use error::FeedError;
pub use inbox::InboxView;
pub use presenter::{
    DeliveryPresenter, PermissionState, PlatformAlert, PlatformError, PlatformNotifier, SweepKind,
    Toast, ToastSink,
};
pub use session::FeedSession;
pub use store::{Invalidator, NotificationStore};
pub use stream::{allowed_transitions, StreamState, StreamStateHandle};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the feed
    pub use crate::{
        FeedConfig, FeedError, FeedSession, InboxView, PermissionState, PlatformAlert,
        PlatformNotifier, StreamState, Toast, ToastSink,
    };
    pub use pulse_model::{Notification, NotificationId, NotificationKind, Severity};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
