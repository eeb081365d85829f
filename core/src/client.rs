//! Verb-per-method HTTP client over a host-supplied transport.
//!
//! # Design
//! `HttpClient` holds a base URL, an optional request hook and the
//! transport. It keeps no per-call state: every verb method runs the same
//! pipeline of resolve URL, build body, run hook, dispatch and normalize,
//! and always resolves to an `HttpResult`. Nothing is returned as `Err` and
//! nothing panics on a failed call.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::body::{build_body, Payload};
use crate::config::{BeforeReq, ClientConfig};
use crate::error::BuildError;
use crate::http::{Fetch, FetchResponse, HttpMethod, Outcome, RequestInit};
use crate::result::HttpResult;

/// Per-call options.
#[derive(Debug, Default)]
pub struct RequestConfig {
    pub headers: Vec<(String, String)>,
    /// Reserved; not consulted when building the request.
    pub params: Option<Map<String, Value>>,
    /// Payload, encoded according to the verb.
    pub data: Option<Payload>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Serialize `value` into a JSON payload.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(Payload::json(value)?);
        Ok(self)
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }
}

#[derive(Clone)]
pub struct HttpClient<T> {
    base_url: String,
    before_req: Option<BeforeReq>,
    transport: T,
}

impl<T: fmt::Debug> fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("before_req", &self.before_req.as_ref().map(|_| "Fn(..)"))
            .field("transport", &self.transport)
            .finish()
    }
}

impl<T: Fetch> HttpClient<T> {
    /// Build a client. Without `base_url`, `config.default_origin` is used.
    pub fn new(transport: T, base_url: Option<&str>, config: ClientConfig) -> Self {
        let base_url = base_url.unwrap_or(&config.default_origin);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            before_req: config.before_req,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Get, path, config.unwrap_or_default())
            .await
    }

    pub async fn post<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Post, path, config.unwrap_or_default())
            .await
    }

    pub async fn put<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Put, path, config.unwrap_or_default())
            .await
    }

    pub async fn patch<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Patch, path, config.unwrap_or_default())
            .await
    }

    /// Dispatches with the `delete` verb.
    pub async fn del<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Delete, path, config.unwrap_or_default())
            .await
    }

    pub async fn head<S, E>(&self, path: &str, config: Option<RequestConfig>) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.request(HttpMethod::Head, path, config.unwrap_or_default())
            .await
    }

    /// Shared pipeline behind every verb method.
    pub async fn request<S, E>(
        &self,
        method: HttpMethod,
        path: &str,
        config: RequestConfig,
    ) -> HttpResult<S, E>
    where
        S: DeserializeOwned,
        E: DeserializeOwned,
    {
        let url = self.resolve_url(path);
        let (url, init) = match self.prepare(method, url, config) {
            Ok(prepared) => prepared,
            Err(error) => {
                warn!(%method, %error, "failed to build request");
                return HttpResult::wrapped(error);
            }
        };

        debug!(method = %init.method, %url, "dispatching request");
        let outcome: Outcome<T::Response> = self.transport.fetch(&url, init).await.into();
        normalize(outcome).await
    }

    /// Absolute `http(s)://` paths are used verbatim; anything else is joined
    /// to the base URL with one slash.
    pub fn resolve_url(&self, path: &str) -> String {
        if is_absolute(path) {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn prepare(
        &self,
        method: HttpMethod,
        mut url: String,
        config: RequestConfig,
    ) -> Result<(String, RequestInit), BuildError> {
        let mut init = RequestInit::new(method);
        init.headers = config.headers;

        init.body = match build_body(method, config.data)? {
            Some(body) if !method.allows_body() => {
                let query = body.into_query_string(method)?;
                if !query.is_empty() {
                    url.push(if url.contains('?') { '&' } else { '?' });
                    url.push_str(&query);
                }
                None
            }
            body => body,
        };

        if let Some(hook) = &self.before_req {
            init = hook(init);
        }
        Ok((url, init))
    }
}

fn is_absolute(path: &str) -> bool {
    path.strip_prefix("http://")
        .or_else(|| path.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty())
}

/// Turn a dispatch outcome into an `HttpResult`.
///
/// Transport failures become a `WrappedError`. Responses are parsed as JSON,
/// falling back to `{"message": <text>}`; the parsed value is the data of an
/// ok response and the error payload otherwise. A body that does not fit the
/// caller's type is returned verbatim as `FailureError::Undecoded`.
pub async fn normalize<R, S, E>(outcome: Outcome<R>) -> HttpResult<S, E>
where
    R: FetchResponse,
    S: DeserializeOwned,
    E: DeserializeOwned,
{
    let response = match outcome {
        Outcome::Failed(error) => {
            warn!(%error, "transport failed");
            return HttpResult::wrapped(error);
        }
        Outcome::Response(response) => response,
    };

    let parsed = match response.clone().json().await {
        Ok(value) => value,
        Err(_) => {
            debug!(status = response.status(), "response body is not JSON, reading as text");
            match response.clone().text().await {
                Ok(message) => json!({ "message": message }),
                Err(error) => {
                    warn!(%error, "failed to read response body");
                    return HttpResult::wrapped(error);
                }
            }
        }
    };

    // decoding borrows so a body that does not fit can be returned verbatim
    if response.ok() {
        match S::deserialize(&parsed) {
            Ok(data) => HttpResult::success(data),
            Err(error) => {
                debug!(%error, "success body does not match the expected type");
                HttpResult::undecoded(parsed)
            }
        }
    } else {
        match E::deserialize(&parsed) {
            Ok(payload) => HttpResult::payload_error(payload),
            Err(error) => {
                debug!(%error, "error body does not match the expected type");
                HttpResult::undecoded(parsed)
            }
        }
    }
}
