//! Error types for the request dispatcher.
//!
//! # Design
//! Every failure carries enough context to tell the five kinds apart: a bad
//! URL, a payload that would not encode, a transport failure (including
//! cancellation and timeouts), a 200 response whose body would not decode,
//! and a non-200 response. `DispatchError::status` recovers the HTTP status
//! the call ended with, `0` when no exchange completed.

use std::borrow::Cow;

use bytes::Bytes;
use thiserror::Error;

/// Error type produced by `Encoder` and `Decoder` implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `Client::dispatch` and `Client::send`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The base URL is malformed or the request URL could not be built.
    #[error("invalid request url: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The request payload could not be encoded.
    #[error("failed to encode request payload: {0}")]
    Encode(#[source] BoxError),

    /// Network-level failure, cancellation or timeout.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered 200 but the body did not fit the response target.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] BoxError),

    /// The server answered with a status other than 200. `body` holds the
    /// response bytes exactly as received; display is lossy UTF-8.
    #[error("{}", String::from_utf8_lossy(.body))]
    Api { status: u16, body: Bytes },
}

impl DispatchError {
    /// HTTP status the call ended with. `0` means no HTTP exchange completed.
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::UrlParse(_) | DispatchError::Encode(_) | DispatchError::Transport(_) => 0,
            DispatchError::Decode(_) => 200,
            DispatchError::Api { status, .. } => *status,
        }
    }

    /// Raw body of a non-200 response.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            DispatchError::Api { body, .. } => Some(&body[..]),
            _ => None,
        }
    }

    /// Body of a non-200 response as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body().map(String::from_utf8_lossy)
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport(TransportError::Http(err))
    }
}

/// Failures below the HTTP status line.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The caller's cancellation token fired before the call completed.
    #[error("request cancelled")]
    Cancelled,

    /// Connect, TLS, timeout or body read failure from the HTTP client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }
}
