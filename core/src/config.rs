//! Construction-time configuration for `HttpClient`.

use std::fmt;
use std::sync::Arc;

use crate::http::RequestInit;

/// Origin used when neither a base URL nor `FETCHWRAP_ORIGIN` is provided.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Environment variable read by `ClientConfig::from_env`.
pub const ORIGIN_ENV: &str = "FETCHWRAP_ORIGIN";

/// Hook run once per call, after the body is built and before dispatch.
/// Its return value replaces the request descriptor.
pub type BeforeReq = Arc<dyn Fn(RequestInit) -> RequestInit + Send + Sync>;

#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL used when the client is built without one.
    pub default_origin: String,
    pub before_req: Option<BeforeReq>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_origin: DEFAULT_ORIGIN.to_string(),
            before_req: None,
        }
    }
}

impl ClientConfig {
    /// Default configuration with the origin taken from `FETCHWRAP_ORIGIN`
    /// when it is set and non-empty.
    pub fn from_env() -> Self {
        let default_origin = std::env::var(ORIGIN_ENV)
            .ok()
            .filter(|origin| !origin.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        Self {
            default_origin,
            before_req: None,
        }
    }

    pub fn with_default_origin(mut self, origin: impl Into<String>) -> Self {
        self.default_origin = origin.into();
        self
    }

    pub fn with_before_req<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestInit) -> RequestInit + Send + Sync + 'static,
    {
        self.before_req = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("default_origin", &self.default_origin)
            .field("before_req", &self.before_req.as_ref().map(|_| "Fn(..)"))
            .finish()
    }
}
