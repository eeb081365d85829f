//! Transport boundary for the host-does-IO pattern.
//!
//! # Design
//! The client never opens a socket. It builds a `RequestInit`, hands it to
//! a `Fetch` implementation supplied by the host, and reads the returned
//! `FetchResponse`. `Outcome` tags the two ways a dispatch can end so the
//! normalization step branches on real data instead of guessing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::body::Body;
use crate::error::TransportError;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    /// Lower-case verb as seen by the request hook and the transport.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
        }
    }

    /// GET and HEAD never carry a body; their payload goes in the query string.
    pub fn allows_body(self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request descriptor handed to the transport (and to the `before_req` hook).
#[derive(Debug)]
pub struct RequestInit {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl RequestInit {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    /// First header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The `fetch` capability: given a URL and a request descriptor, produce a
/// response or fail.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Response: FetchResponse;

    async fn fetch(&self, url: &str, init: RequestInit) -> Result<Self::Response, TransportError>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    type Response = F::Response;

    async fn fetch(&self, url: &str, init: RequestInit) -> Result<Self::Response, TransportError> {
        (**self).fetch(url, init).await
    }
}

/// A response whose body can be read more than once by cloning it first.
///
/// `json` and `text` consume the value they are called on; callers clone
/// before each read so the original stays available.
#[async_trait]
pub trait FetchResponse: Clone + Send + Sync {
    /// True when the status is in the 2xx range.
    fn ok(&self) -> bool;

    fn status(&self) -> u16;

    async fn json(self) -> Result<serde_json::Value, TransportError>;

    async fn text(self) -> Result<String, TransportError>;
}

/// Raw result of one dispatch, before normalization.
#[derive(Debug)]
pub enum Outcome<R> {
    Response(R),
    Failed(TransportError),
}

impl<R> From<Result<R, TransportError>> for Outcome<R> {
    fn from(result: Result<R, TransportError>) -> Self {
        match result {
            Ok(response) => Outcome::Response(response),
            Err(error) => Outcome::Failed(error),
        }
    }
}

/// In-memory response: a status plus the full body text.
///
/// Handy for transports that read the whole body eagerly, and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[async_trait]
impl FetchResponse for HttpResponse {
    fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn status(&self) -> u16 {
        self.status
    }

    async fn json(self) -> Result<serde_json::Value, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Body(e.to_string()))
    }

    async fn text(self) -> Result<String, TransportError> {
        Ok(self.body)
    }
}
