//! Client configuration and the request dispatcher.
//!
//! # Design
//! `Client` holds immutable configuration plus a `reqwest::Client`, whose
//! connection pool is shared by clones. Every call to `send` is independent:
//! build the URL, encode the payload, run the exchange against the caller's
//! cancellation token, then route on the status code. Only a 200 is a
//! success; any other status comes back as `DispatchError::Api` with the
//! body text untouched.

use std::{collections::HashMap, time::Duration};

use reqwest::header::CONTENT_TYPE;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::codec::{Decoder, Encoder, Json};
use crate::endpoint::build_request_url;
use crate::error::{DispatchError, TransportError};
use crate::http::{HttpMethod, Request};

/// Overall per-call deadline used unless `ClientBuilder::timeout` overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// How the underlying HTTP transport treats TLS certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Certificates are validated against the bundled root store.
    #[default]
    Standard,
    /// Certificate validation is skipped entirely.
    ///
    /// This is a security downgrade: any server, including one impersonating
    /// the API, is accepted. Only use it for trusted internal or test
    /// endpoints.
    InsecureSkipVerify,
}

/// Dispatcher for a JSON REST API rooted at `base_url`.
#[derive(Debug, Clone)]
pub struct Client<E = Json, D = Json> {
    base_url: String,
    timeout: Duration,
    transport: Transport,
    http: reqwest::Client,
    encoder: E,
    decoder: D,
}

impl Client {
    /// Client with the default timeout, transport and JSON codecs.
    pub fn new(base_url: &str) -> Result<Self, DispatchError> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: &str) -> ClientBuilder {
        ClientBuilder {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            transport: Transport::Standard,
            encoder: Json,
            decoder: Json,
        }
    }
}

impl<E: Encoder, D: Decoder> Client<E, D> {
    /// Base URL with any trailing `/` removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Run one request/response exchange.
    ///
    /// On a 200 response the body is decoded into `target`, if given, and
    /// `Ok(200)` is returned. `DispatchError::status` tells the failure
    /// cases apart: `0` when no exchange completed, `200` for a body that
    /// would not decode, otherwise the server's status.
    pub async fn dispatch<P, T>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        method: HttpMethod,
        target: Option<&mut T>,
        payload: Option<&P>,
        params: Option<&HashMap<String, String>>,
    ) -> Result<u16, DispatchError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Request {
            method,
            endpoint,
            payload,
            target,
            params,
        };
        self.send(cancel, request).await
    }

    /// Same as `dispatch`, taking a `Request` descriptor.
    pub async fn send<P, T>(
        &self,
        cancel: &CancellationToken,
        request: Request<'_, P, T>,
    ) -> Result<u16, DispatchError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = build_request_url(&self.base_url, request.endpoint, request.params)?;

        let body = request
            .payload
            .map(|payload| self.encoder.encode(payload))
            .transpose()
            .map_err(DispatchError::Encode)?;

        let mut builder = self.http.request(request.method.into(), url);
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }

        // The body is read to the end here, so the connection is released
        // before any status routing happens.
        let (status, bytes) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            result = async {
                let response = builder.send().await?;
                let status = response.status().as_u16();
                let bytes = response.bytes().await?;
                Ok::<_, reqwest::Error>((status, bytes))
            } => result?,
        };

        if status != 200 {
            return Err(DispatchError::Api {
                status,
                body: bytes,
            });
        }

        if let Some(target) = request.target {
            *target = self.decoder.decode(&bytes).map_err(DispatchError::Decode)?;
        }
        Ok(status)
    }
}

/// Chainable construction options for `Client`. Later calls override earlier
/// ones; the HTTP transport is built once, in `build`.
#[derive(Debug, Clone)]
pub struct ClientBuilder<E = Json, D = Json> {
    base_url: String,
    timeout: Duration,
    transport: Transport,
    encoder: E,
    decoder: D,
}

impl<E: Encoder, D: Decoder> ClientBuilder<E, D> {
    /// Overall deadline for each call, covering connect, send and body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Skip TLS certificate validation. See `Transport::InsecureSkipVerify`.
    pub fn disable_tls_verification(self) -> Self {
        self.transport(Transport::InsecureSkipVerify)
    }

    pub fn encoder<E2: Encoder>(self, encoder: E2) -> ClientBuilder<E2, D> {
        ClientBuilder {
            base_url: self.base_url,
            timeout: self.timeout,
            transport: self.transport,
            encoder,
            decoder: self.decoder,
        }
    }

    pub fn decoder<D2: Decoder>(self, decoder: D2) -> ClientBuilder<E, D2> {
        ClientBuilder {
            base_url: self.base_url,
            timeout: self.timeout,
            transport: self.transport,
            encoder: self.encoder,
            decoder,
        }
    }

    /// Fails only if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<Client<E, D>, DispatchError> {
        let mut http = reqwest::Client::builder().timeout(self.timeout);
        if self.transport == Transport::InsecureSkipVerify {
            http = http.danger_accept_invalid_certs(true);
        }
        let http = http.build()?;

        debug!(
            base_url = %self.base_url,
            timeout = ?self.timeout,
            transport = ?self.transport,
            "built API client"
        );

        Ok(Client {
            base_url: self.base_url,
            timeout: self.timeout,
            transport: self.transport,
            http,
            encoder: self.encoder,
            decoder: self.decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::error::BoxError;

    /// Port 9 (discard) is never served in the test environment.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    struct Refuse;

    impl Encoder for Refuse {
        fn encode<T: Serialize + ?Sized>(&self, _value: &T) -> Result<Vec<u8>, BoxError> {
            Err("payload shape not supported".into())
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct Pool {
        id: String,
    }

    #[test]
    fn defaults() {
        let client = Client::new(UNREACHABLE).unwrap();
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.timeout(), Duration::from_secs(20));
        assert_eq!(client.transport(), Transport::Standard);
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let client = Client::new("http://localhost:4000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");

        let client = Client::new("http://localhost:4000/api//").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000/api");
    }

    #[test]
    fn later_options_override_earlier_ones() {
        let client = Client::builder(UNREACHABLE)
            .timeout(Duration::from_secs(1))
            .disable_tls_verification()
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(250));
        assert_eq!(client.transport(), Transport::InsecureSkipVerify);

        let client = Client::builder(UNREACHABLE)
            .disable_tls_verification()
            .transport(Transport::Standard)
            .build()
            .unwrap();
        assert_eq!(client.transport(), Transport::Standard);
    }

    #[test]
    fn timeout_survives_tls_option() {
        let client = Client::builder(UNREACHABLE)
            .disable_tls_verification()
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(3));
        assert_eq!(client.transport(), Transport::InsecureSkipVerify);
    }

    #[tokio::test]
    async fn malformed_base_url_fails_before_any_io() {
        let client = Client::new("::not a url::").unwrap();
        let err = client
            .send(&CancellationToken::new(), Request::new(HttpMethod::Get, "/pools"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UrlParse(_)));
        assert_eq!(err.status(), 0);
    }

    #[tokio::test]
    async fn encode_failure_is_reported_with_status_0() {
        let client = Client::builder(UNREACHABLE).encoder(Refuse).build().unwrap();
        let err = client
            .send(
                &CancellationToken::new(),
                Request::new(HttpMethod::Post, "/pools").payload(&42),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Encode(_)));
        assert_eq!(err.status(), 0);
        assert!(err.to_string().contains("payload shape not supported"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = Client::new(UNREACHABLE).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut pool = Pool::default();
        let err = client
            .dispatch(&cancel, "/pools", HttpMethod::Get, Some(&mut pool), None::<&()>, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transport(TransportError::Cancelled)
        ));
        assert_eq!(err.status(), 0);
        assert!(pool.id.is_empty());
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let client = Client::builder(UNREACHABLE)
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = client
            .send(&CancellationToken::new(), Request::new(HttpMethod::Get, "/pools"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(TransportError::Http(_))));
        assert_eq!(err.status(), 0);
    }
}
