//! Payload shapes and the verb-driven body construction policy.
//!
//! # Design
//! A caller hands over a `Payload`; `build_body` turns it into the `Body`
//! that goes on the wire. The choice depends only on the verb and the
//! payload variant:
//! - wire-ready shapes (text, bytes, blob, stream, form, query) pass through
//!   untouched;
//! - a JSON mapping becomes a query string for GET/HEAD and pretty-printed
//!   JSON text for every other verb.

use std::fmt;

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::BuildError;
use crate::http::HttpMethod;

/// Binary data with an optional MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
    pub mime: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, mime: Option<&str>) -> Self {
        Self {
            data: data.into(),
            mime: mime.map(str::to_string),
        }
    }
}

/// Streamed request body.
pub struct ByteStream(BoxStream<'static, Result<Bytes, std::io::Error>>);

impl ByteStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self(stream.boxed())
    }

    /// Drain the stream into one contiguous buffer.
    pub async fn collect(self) -> Result<Bytes, std::io::Error> {
        let buf = self
            .0
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(buf.freeze())
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByteStream(..)")
    }
}

/// Ordered, repeatable query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string.
    pub fn parse(input: &str) -> Self {
        form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish();
        f.write_str(&encoded)
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Pre-built multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    boundary: String,
    parts: Vec<(String, FormValue)>,
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl FormData {
    pub fn new() -> Self {
        Self {
            boundary: format!("----fetchwrap-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormValue::File {
                filename: filename.into(),
                content_type: content_type.map(str::to_string),
                data: data.into(),
            },
        ));
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }

    /// Encode as `multipart/form-data` using this form's boundary.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        for (name, value) in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match value {
                FormValue::Text(text) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                FormValue::File {
                    filename,
                    content_type,
                    data,
                } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                        )
                        .as_bytes(),
                    );
                    let content_type = content_type.as_deref().unwrap_or("application/octet-stream");
                    out.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                    out.extend_from_slice(data);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out.freeze()
    }
}

/// What a caller passes as `data`.
#[derive(Debug)]
pub enum Payload {
    Text(String),
    /// Raw buffer or a view over one.
    Bytes(Bytes),
    Blob(Blob),
    Stream(ByteStream),
    Form(FormData),
    Query(QueryParams),
    /// Key-value mapping, encoded according to the verb.
    Json(Value),
}

impl Payload {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Payload::Json)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value.into())
    }
}

impl From<Blob> for Payload {
    fn from(value: Blob) -> Self {
        Payload::Blob(value)
    }
}

impl From<ByteStream> for Payload {
    fn from(value: ByteStream) -> Self {
        Payload::Stream(value)
    }
}

impl From<FormData> for Payload {
    fn from(value: FormData) -> Self {
        Payload::Form(value)
    }
}

impl From<QueryParams> for Payload {
    fn from(value: QueryParams) -> Self {
        Payload::Query(value)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// A payload after verb-specific encoding.
#[derive(Debug)]
pub enum Body {
    Text(String),
    Bytes(Bytes),
    Blob(Blob),
    Stream(ByteStream),
    Form(FormData),
    Query(QueryParams),
    /// Pretty-printed JSON text (two-space indent).
    Json(String),
}

impl Body {
    /// Content type a transport should send when the caller set none.
    pub fn content_type(&self) -> String {
        match self {
            Body::Text(_) => "text/plain;charset=UTF-8".to_string(),
            Body::Json(_) => "application/json".to_string(),
            Body::Blob(blob) => blob
                .mime
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            Body::Bytes(_) | Body::Stream(_) => "application/octet-stream".to_string(),
            Body::Query(_) => "application/x-www-form-urlencoded;charset=UTF-8".to_string(),
            Body::Form(form) => format!("multipart/form-data; boundary={}", form.boundary()),
        }
    }

    /// Bytes that go on the wire.
    pub async fn into_bytes(self) -> Result<Bytes, std::io::Error> {
        Ok(match self {
            Body::Text(text) | Body::Json(text) => Bytes::from(text),
            Body::Bytes(bytes) => bytes,
            Body::Blob(blob) => blob.data,
            Body::Stream(stream) => stream.collect().await?,
            Body::Form(form) => form.encode(),
            Body::Query(query) => Bytes::from(query.to_string()),
        })
    }

    fn shape(&self) -> &'static str {
        match self {
            Body::Text(_) => "text",
            Body::Bytes(_) => "binary",
            Body::Blob(_) => "blob",
            Body::Stream(_) => "stream",
            Body::Form(_) => "form data",
            Body::Query(_) => "query",
            Body::Json(_) => "JSON",
        }
    }

    /// Query-string form of a GET/HEAD body. Only text and query bodies have one.
    pub fn into_query_string(self, method: HttpMethod) -> Result<String, BuildError> {
        match self {
            Body::Text(text) => Ok(text),
            Body::Query(query) => Ok(query.to_string()),
            other => Err(BuildError::UnsupportedQuery {
                method: method.as_str(),
                shape: other.shape(),
            }),
        }
    }
}

/// Encode `payload` for `method`. `None` means the request carries no body.
pub fn build_body(method: HttpMethod, payload: Option<Payload>) -> Result<Option<Body>, BuildError> {
    let body = match payload {
        None => return Ok(None),
        Some(Payload::Json(value)) if is_falsy(&value) => return Ok(None),
        Some(Payload::Text(text)) if text.is_empty() => return Ok(None),
        Some(Payload::Text(text)) => Body::Text(text),
        Some(Payload::Bytes(bytes)) => Body::Bytes(bytes),
        Some(Payload::Blob(blob)) => Body::Blob(blob),
        Some(Payload::Stream(stream)) => Body::Stream(stream),
        Some(Payload::Form(form)) => Body::Form(form),
        Some(Payload::Query(query)) => Body::Query(query),
        Some(Payload::Json(value)) if !method.allows_body() => {
            Body::Query(flatten_query(method, value)?)
        }
        Some(Payload::Json(value)) => Body::Json(serde_json::to_string_pretty(&value)?),
    };
    Ok(Some(body))
}

/// `null`, `false` and zero count as "no payload".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Flatten a JSON mapping into query parameters, one occurrence per array
/// element.
fn flatten_query(method: HttpMethod, value: Value) -> Result<QueryParams, BuildError> {
    let entries: Vec<(String, Value)> = match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        _ => {
            return Err(BuildError::UnsupportedQuery {
                method: method.as_str(),
                shape: "scalar JSON",
            })
        }
    };

    let mut params = QueryParams::new();
    for (key, value) in entries {
        match value {
            Value::Array(items) => {
                for item in items {
                    params.append(key.clone(), query_text(item));
                }
            }
            other => params.append(key, query_text(other)),
        }
    }
    Ok(params)
}

fn query_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        // numbers, bools, null and nested structures use their compact JSON text
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn built(method: HttpMethod, payload: impl Into<Payload>) -> Body {
        build_body(method, Some(payload.into())).unwrap().unwrap()
    }

    #[test]
    fn no_payload_means_no_body() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
            HttpMethod::Head,
        ] {
            assert!(build_body(method, None).unwrap().is_none());
            assert!(build_body(method, Some(Payload::Json(Value::Null))).unwrap().is_none());
            assert!(build_body(method, Some("".into())).unwrap().is_none());
            assert!(build_body(method, Some(json!(false).into())).unwrap().is_none());
            assert!(build_body(method, Some(json!(0).into())).unwrap().is_none());
            assert!(build_body(method, Some(json!(0.0).into())).unwrap().is_none());
        }
    }

    #[test]
    fn post_mapping_is_pretty_json() {
        let body = built(HttpMethod::Post, json!({ "a": 1, "b": [true, null] }));
        match body {
            Body::Json(text) => assert_eq!(
                text,
                "{\n  \"a\": 1,\n  \"b\": [\n    true,\n    null\n  ]\n}"
            ),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn get_mapping_repeats_array_keys_in_order() {
        let body = built(HttpMethod::Get, json!({ "tag": ["x", "y"], "page": 2 }));
        match body {
            Body::Query(query) => {
                assert_eq!(query.get_all("tag").collect::<Vec<_>>(), vec!["x", "y"]);
                assert_eq!(query.to_string(), "tag=x&tag=y&page=2");
            }
            other => panic!("expected query body, got {other:?}"),
        }
    }

    #[test]
    fn nested_objects_become_compact_json_in_queries() {
        let body = built(HttpMethod::Head, json!({ "filter": { "a": 1 }, "n": null }));
        let query = body.into_query_string(HttpMethod::Head).unwrap();
        assert_eq!(
            QueryParams::parse(&query),
            QueryParams::from_iter([("filter", r#"{"a":1}"#), ("n", "null")])
        );
    }

    #[test]
    fn top_level_array_flattens_with_index_keys() {
        let body = built(HttpMethod::Get, json!(["a", "b"]));
        assert_eq!(body.into_query_string(HttpMethod::Get).unwrap(), "0=a&1=b");
    }

    #[test]
    fn scalar_json_cannot_be_a_query() {
        let err = build_body(HttpMethod::Get, Some(json!(5).into())).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedQuery { .. }));
        assert!(matches!(built(HttpMethod::Put, json!(5)), Body::Json(text) if text == "5"));
        assert!(matches!(built(HttpMethod::Post, json!(true)), Body::Json(text) if text == "true"));
    }

    #[test]
    fn wire_ready_payloads_pass_through_for_every_verb() {
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete] {
            assert!(matches!(built(method, "raw"), Body::Text(t) if t == "raw"));
            assert!(matches!(built(method, vec![1u8, 2]), Body::Bytes(b) if b == Bytes::from_static(&[1, 2])));

            let blob = Blob::new(&b"img"[..], Some("image/png"));
            assert!(matches!(built(method, blob.clone()), Body::Blob(b) if b == blob));

            let form = FormData::new().text("k", "v");
            assert!(matches!(built(method, form.clone()), Body::Form(f) if f == form));

            let query = QueryParams::from_iter([("q", "1")]);
            assert!(matches!(built(method, query.clone()), Body::Query(q) if q == query));

            let chunks = futures::stream::iter(vec![Ok(Bytes::from_static(b"s"))]);
            assert!(matches!(built(method, ByteStream::new(chunks)), Body::Stream(_)));
        }
        assert!(matches!(built(HttpMethod::Get, "a=1"), Body::Text(t) if t == "a=1"));
    }

    #[test]
    fn only_text_and_query_move_into_the_url() {
        let err = built(HttpMethod::Get, vec![1u8])
            .into_query_string(HttpMethod::Get)
            .unwrap_err();
        assert_eq!(err.to_string(), "get request cannot carry a binary payload");
    }

    #[test]
    fn query_params_use_form_encoding() {
        let mut query = QueryParams::new();
        query.append("name", "a b&c");
        query.append("ü", "=");
        assert_eq!(query.to_string(), "name=a+b%26c&%C3%BC=%3D");
        assert_eq!(QueryParams::parse(&format!("?{query}")), query);
    }

    #[test]
    fn content_types_follow_the_body_shape() {
        assert_eq!(Body::Json("{}".into()).content_type(), "application/json");
        assert_eq!(Body::Text("x".into()).content_type(), "text/plain;charset=UTF-8");
        assert_eq!(
            Body::Blob(Blob::new(Bytes::new(), None)).content_type(),
            "application/octet-stream"
        );
        let form = FormData::new();
        let expected = format!("multipart/form-data; boundary={}", form.boundary());
        assert_eq!(Body::Form(form).content_type(), expected);
    }

    #[test]
    fn multipart_encoding_lists_every_part() {
        let form = FormData::new()
            .text("title", "hi")
            .file("doc", "a.txt", Some("text/plain"), &b"abc"[..]);
        let boundary = form.boundary().to_string();
        let encoded = String::from_utf8(form.encode().to_vec()).unwrap();
        assert_eq!(
            encoded,
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhi\r\n\
                 --{boundary}\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\
                 Content-Type: text/plain\r\n\r\nabc\r\n--{boundary}--\r\n"
            )
        );
    }

    #[tokio::test]
    async fn streams_collect_in_order() {
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]);
        let body = built(HttpMethod::Post, ByteStream::new(chunks));
        assert!(matches!(body, Body::Stream(_)));
        assert_eq!(body.into_bytes().await.unwrap(), Bytes::from_static(b"abcd"));
    }

    #[tokio::test]
    async fn failing_stream_surfaces_io_error() {
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(std::io::Error::other("cut")),
        ]);
        let err = ByteStream::new(chunks).collect().await.unwrap_err();
        assert_eq!(err.to_string(), "cut");
    }
}
