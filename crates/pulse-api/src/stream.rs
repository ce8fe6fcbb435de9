//! Push-channel transport
//!
//! The collaborator exposes a one-way event stream of newline-delimited JSON.
//! The transport cannot set custom headers, so the bearer token rides in the
//! connection URI. Absence of a token is a hard precondition failure: the
//! caller logs it and stops, it never retries.

use crate::error::ApiError;
use crate::session::TokenStore;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use pulse_model::StreamEvent;

/// Boxed stream of decoded push events.
///
/// Ends when the server closes the connection; yields `Err` on transport
/// failures. Malformed lines are dropped by the decoder and never surface
/// here.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ApiError>>;

/// One-way push connection factory.
///
/// Each call opens a fresh connection; the receiver owns reconnect policy.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Open a connection to the event stream.
    async fn connect(&self) -> Result<EventStream, ApiError>;
}

/// Reassembles newline-delimited JSON across transport chunk boundaries.
///
/// A line that fails to parse is dropped with a warning; one bad payload
/// must not tear down the connection. Blank lines are ignored.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk; returns every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = trim_line(&line);
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<StreamEvent>(line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!("dropping malformed stream line: {err}");
                }
            }
        }
        events
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut line = line;
    while let [rest @ .., last] = line {
        if *last == b'\n' || *last == b'\r' {
            line = rest;
        } else {
            break;
        }
    }
    line
}

/// reqwest-backed implementation of [`StreamConnector`].
#[derive(Debug, Clone)]
pub struct HttpStreamConnector {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpStreamConnector {
    /// Create a connector against `base_url` (no trailing slash needed).
    #[must_use]
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tokens)
    }

    /// Create a connector reusing an existing connection pool.
    #[must_use]
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl StreamConnector for HttpStreamConnector {
    async fn connect(&self) -> Result<EventStream, ApiError> {
        let token = self.tokens.require()?;

        let resp = self
            .http
            .get(format!("{}/sse/stream", self.base_url))
            .query(&[("token", token)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
            });
        }

        let mut decoder = LineDecoder::new();
        let events = resp
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => futures::stream::iter(
                    decoder
                        .feed(&bytes)
                        .into_iter()
                        .map(Ok)
                        .collect::<Vec<_>>(),
                ),
                Err(err) => futures::stream::iter(vec![Err(ApiError::Transport(err))]),
            })
            .flatten();

        Ok(events.boxed())
    }
}
