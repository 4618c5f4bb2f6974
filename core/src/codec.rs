//! Pluggable payload encoding and response decoding.
//!
//! # Design
//! `Encoder` and `Decoder` are separate traits so a client can swap one side
//! without the other. Both methods are generic over the serde types involved,
//! which keeps the dispatcher type-safe at the encode/decode boundary and
//! means the client is generic over its codecs rather than boxing them.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::BoxError;

/// Turns a request payload into body bytes.
pub trait Encoder: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, BoxError>;
}

/// Turns response body bytes into a value of the caller's target type.
pub trait Decoder: Send + Sync {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError>;
}

/// Default codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Encoder for Json {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(value)?)
    }
}

impl Decoder for Json {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Wraps another codec and reports each encode/decode through `tracing`.
///
/// ```no_run
/// use apiclient_core::{Client, Json, Traced};
///
/// let client = Client::builder("https://pool.example.com")
///     .encoder(Traced(Json))
///     .decoder(Traced(Json))
///     .build()?;
/// # Ok::<_, apiclient_core::DispatchError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Traced<C>(pub C);

impl<C: Encoder> Encoder for Traced<C> {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, BoxError> {
        match self.0.encode(value) {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "encoded request payload");
                Ok(bytes)
            }
            Err(err) => {
                warn!(error = %err, "request payload encoding failed");
                Err(err)
            }
        }
    }
}

impl<C: Decoder> Decoder for Traced<C> {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        match self.0.decode(bytes) {
            Ok(value) => {
                debug!(bytes = bytes.len(), "decoded response body");
                Ok(value)
            }
            Err(err) => {
                warn!(bytes = bytes.len(), error = %err, "response body decoding failed");
                Err(err)
            }
        }
    }
}
