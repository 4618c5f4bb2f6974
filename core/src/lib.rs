//! Generic request dispatcher for JSON REST APIs.
//!
//! # Overview
//! `Client` turns an endpoint path, an HTTP method, an optional payload, an
//! optional response target and optional query parameters into one HTTP
//! exchange. A 200 response is decoded into the target; any other status is
//! returned as an error carrying the raw body.
//!
//! # Design
//! - The endpoint replaces the base URL's path (`endpoint::build_request_url`).
//! - Encoding and decoding are strategies (`codec::Encoder`,
//!   `codec::Decoder`), JSON by default, chosen at construction.
//! - Each call races the caller's `CancellationToken` and is bounded by the
//!   client's timeout. Nothing is retried and nothing is logged by the
//!   dispatcher; wrap a codec in `codec::Traced` for instrumentation.
//! - API-specific operations live with the caller and delegate to
//!   `Client::dispatch`.

pub mod client;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod http;

pub use client::{Client, ClientBuilder, Transport, DEFAULT_TIMEOUT};
pub use codec::{Decoder, Encoder, Json, Traced};
pub use endpoint::build_request_url;
pub use error::{BoxError, DispatchError, TransportError};
pub use http::{HttpMethod, Request};
pub use tokio_util::sync::CancellationToken;
