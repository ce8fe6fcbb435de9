//! Error types for the collaborator API surface
//!
//! The feed's failure taxonomy starts here: everything except a missing
//! session token is transient and retried on the next scheduled tick or
//! reconnect.

/// Errors produced by the collaborator HTTP and stream surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No bearer token in the session store; a hard precondition failure,
    /// not something a retry can fix
    #[error("no session token available")]
    MissingToken,

    /// Transport-level failure (connect, send, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success, non-304 response status
    #[error("unexpected status: {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// A payload that did not decode
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the next scheduled tick or reconnect should retry.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_not_transient() {
        assert!(!ApiError::MissingToken.is_transient());
        assert!(ApiError::Status { status: 500 }.is_transient());
    }

    #[test]
    fn display_is_lowercase_and_terse() {
        let err = ApiError::Status { status: 503 };
        assert_eq!(err.to_string(), "unexpected status: 503");
    }
}
