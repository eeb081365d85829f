//! The uniform value every call resolves to.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use crate::error::WrappedError;

/// Per-request metadata attached to every result. Currently carries nothing
/// and serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RequestMeta {}

/// Error side of a failed call.
///
/// `Wrapped` means the call failed before a response existed (transport or
/// request-building failure). `Payload` is the server's own error body.
/// `Undecoded` is a server body that did not fit the caller's type, kept
/// verbatim. Serialized untagged, so a wrapped error looks like
/// `{"message": ..}` and the other two look like the server body.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FailureError<E> {
    Wrapped(WrappedError),
    Payload(E),
    Undecoded(Value),
}

impl<E> FailureError<E> {
    pub fn is_wrapped(&self) -> bool {
        matches!(self, FailureError::Wrapped(_))
    }

    pub fn payload(&self) -> Option<&E> {
        match self {
            FailureError::Payload(payload) => Some(payload),
            FailureError::Wrapped(_) | FailureError::Undecoded(_) => None,
        }
    }

    /// Raw server body that did not decode into the caller's type.
    pub fn undecoded(&self) -> Option<&Value> {
        match self {
            FailureError::Undecoded(body) => Some(body),
            FailureError::Wrapped(_) | FailureError::Payload(_) => None,
        }
    }
}

/// Outcome of one call: success with decoded data, or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpResult<S, E> {
    Success { data: S, request: RequestMeta },
    Failure {
        error: FailureError<E>,
        request: RequestMeta,
    },
}

impl<S, E> HttpResult<S, E> {
    pub fn success(data: S) -> Self {
        HttpResult::Success {
            data,
            request: RequestMeta::default(),
        }
    }

    pub fn wrapped(error: impl Into<WrappedError>) -> Self {
        HttpResult::Failure {
            error: FailureError::Wrapped(error.into()),
            request: RequestMeta::default(),
        }
    }

    pub fn payload_error(error: E) -> Self {
        HttpResult::Failure {
            error: FailureError::Payload(error),
            request: RequestMeta::default(),
        }
    }

    pub fn undecoded(body: Value) -> Self {
        HttpResult::Failure {
            error: FailureError::Undecoded(body),
            request: RequestMeta::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HttpResult::Success { .. })
    }

    pub fn data(&self) -> Option<&S> {
        match self {
            HttpResult::Success { data, .. } => Some(data),
            HttpResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&FailureError<E>> {
        match self {
            HttpResult::Failure { error, .. } => Some(error),
            HttpResult::Success { .. } => None,
        }
    }

    pub fn request(&self) -> &RequestMeta {
        match self {
            HttpResult::Success { request, .. } | HttpResult::Failure { request, .. } => request,
        }
    }

    pub fn into_result(self) -> Result<S, FailureError<E>> {
        match self {
            HttpResult::Success { data, .. } => Ok(data),
            HttpResult::Failure { error, .. } => Err(error),
        }
    }
}

impl<S: Serialize, E: Serialize> Serialize for HttpResult<S, E> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        let mut state = serializer.serialize_struct("HttpResult", 3)?;
        match self {
            HttpResult::Success { data, request } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.serialize_field("request", request)?;
            }
            HttpResult::Failure { error, request } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("request", request)?;
            }
        }
        state.end()
    }
}
