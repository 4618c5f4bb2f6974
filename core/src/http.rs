//! HTTP method and the per-call request descriptor.
//!
//! # Design
//! `Request` borrows everything it describes: the payload and the response
//! target stay owned by the caller, and the descriptor is consumed by a
//! single `Client::send`. `Request::new` starts from `()` for both the
//! payload and the target types so absent parts need no type annotations.

use std::collections::HashMap;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// One dispatch described as borrowed data.
#[derive(Debug)]
pub struct Request<'a, P: ?Sized = (), T = ()> {
    pub method: HttpMethod,
    pub endpoint: &'a str,
    pub payload: Option<&'a P>,
    pub target: Option<&'a mut T>,
    pub params: Option<&'a HashMap<String, String>>,
}

impl<'a> Request<'a> {
    pub fn new(method: HttpMethod, endpoint: &'a str) -> Self {
        Self {
            method,
            endpoint,
            payload: None,
            target: None,
            params: None,
        }
    }
}

impl<'a, P: ?Sized, T> Request<'a, P, T> {
    /// Send `payload` as the request body.
    pub fn payload<Q: ?Sized>(self, payload: &'a Q) -> Request<'a, Q, T> {
        Request {
            method: self.method,
            endpoint: self.endpoint,
            payload: Some(payload),
            target: self.target,
            params: self.params,
        }
    }

    /// Decode a 200 response body into `target`.
    pub fn target<U>(self, target: &'a mut U) -> Request<'a, P, U> {
        Request {
            method: self.method,
            endpoint: self.endpoint,
            payload: self.payload,
            target: Some(target),
            params: self.params,
        }
    }

    pub fn params(mut self, params: &'a HashMap<String, String>) -> Self {
        self.params = Some(params);
        self
    }
}
