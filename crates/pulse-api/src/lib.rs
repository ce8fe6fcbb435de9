//! Collaborator API surface for the Pulseboard feed
//!
//! The dashboard backend owns notifications; this crate is the client-side
//! contract against it:
//! - [`FeedApi`]: the REST questions the feed asks (list, sweeps, mark-read)
//! - [`HttpFeedApi`]: the reqwest-backed implementation
//! - [`TokenStore`]: the session's bearer token handle
//! - [`StreamConnector`] / [`HttpStreamConnector`]: the one-way push channel
//! - [`LineDecoder`]: newline-delimited JSON reassembly for the push body
//!
//! Everything network-shaped returns [`ApiError`]; callers decide which
//! failures are transient.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod session;
pub mod stream;

// Re-exports for convenience
pub use client::{FeedApi, HttpFeedApi};
pub use error::ApiError;
pub use session::TokenStore;
pub use stream::{EventStream, HttpStreamConnector, LineDecoder, StreamConnector};

#[cfg(feature = "mocks")]
pub use client::MockFeedApi;
#[cfg(feature = "mocks")]
pub use stream::MockStreamConnector;
