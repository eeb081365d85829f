//! Fetch-style HTTP client core.
//!
//! # Overview
//! Wraps a host-supplied `fetch` transport and normalizes every call into a
//! single `HttpResult`: network failures, non-2xx responses and successes
//! all come back as data, never as `Err` or a panic.
//!
//! # Design
//! - `HttpClient` holds only static configuration (base URL, request hook)
//!   and the transport; calls share no state and may run concurrently.
//! - The request body is chosen from the verb and the payload shape alone
//!   (`body::build_body`).
//! - The transport is a trait (`Fetch` / `FetchResponse`), so the core never
//!   performs I/O itself and tests can substitute an in-memory transport.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod result;

pub use body::{Blob, Body, ByteStream, FormData, FormValue, Payload, QueryParams};
pub use client::{normalize, HttpClient, RequestConfig};
pub use config::{BeforeReq, ClientConfig, DEFAULT_ORIGIN, ORIGIN_ENV};
pub use error::{BuildError, TransportError, WrappedError};
pub use http::{Fetch, FetchResponse, HttpMethod, HttpResponse, Outcome, RequestInit};
pub use result::{FailureError, HttpResult, RequestMeta};
