//! Error types for the feed engine

use pulse_api::ApiError;

/// Errors surfaced to the embedding UI.
///
/// Delivery-path failures never appear here; they are logged and retried by
/// the owning timer. Only user-initiated operations (mark-read, mark-all)
/// return errors the UI must act on.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A collaborator call failed
    #[error("collaborator call failed: {0}")]
    Api(#[from] ApiError),
}

impl FeedError {
    /// Whether retrying the operation can help.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(err) => err.is_transient(),
        }
    }
}
