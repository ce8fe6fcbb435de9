//! Session token storage
//!
//! The dashboard keeps its bearer token in host session storage; this is the
//! feed-side handle to it. Login sets it, logout clears it, and every
//! authenticated call reads it at request time so a logout mid-session is
//! observed by the very next request.

use crate::error::ApiError;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared handle to the session's bearer token.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// Create an empty (unauthenticated) store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token.
    #[inline]
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Store the token issued at login.
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    /// Drop the token at logout.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Current token, if any.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner.read().clone()
    }

    /// Current token, or [`ApiError::MissingToken`].
    pub fn require(&self) -> Result<String, ApiError> {
        self.get().ok_or(ApiError::MissingToken)
    }

    /// Whether a token is present.
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_some()
    }
}
