//! Verify request construction and response normalization against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Request vectors are replayed through `HttpClient` with a transport that
//! records what it was handed. Results are compared as serialized JSON so
//! field ordering never matters.

use std::sync::Mutex;

use async_trait::async_trait;
use fetchwrap_core::{
    normalize, Body, ClientConfig, Fetch, HttpClient, HttpResponse, HttpResult, Outcome, Payload,
    RequestConfig, RequestInit, TransportError,
};
use serde_json::Value;

/// Records the last dispatch and answers `200 {}`.
#[derive(Default)]
struct Capture {
    last: Mutex<Option<(String, RequestInit)>>,
}

#[async_trait]
impl Fetch for Capture {
    type Response = HttpResponse;

    async fn fetch(&self, url: &str, init: RequestInit) -> Result<HttpResponse, TransportError> {
        *self.last.lock().unwrap() = Some((url.to_string(), init));
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "{}".to_string(),
        })
    }
}

/// Build the payload described by a vector's `payload` field.
fn payload(raw: &Value) -> Option<Payload> {
    if raw.is_null() {
        return None;
    }
    let value = raw["value"].clone();
    match raw["kind"].as_str().unwrap() {
        "json" => Some(Payload::Json(value)),
        "text" => Some(Payload::Text(value.as_str().unwrap().to_string())),
        other => panic!("unknown payload kind: {other}"),
    }
}

/// Describe a dispatched body the way the vectors do.
fn describe(body: Option<Body>) -> Value {
    match body {
        None => Value::Null,
        Some(Body::Json(text)) => serde_json::json!({ "kind": "json", "text": text }),
        Some(Body::Text(text)) => serde_json::json!({ "kind": "text", "text": text }),
        Some(other) => panic!("unexpected body in vectors: {other:?}"),
    }
}

#[tokio::test]
async fn body_test_vectors() {
    let raw = include_str!("../../test-vectors/body.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let base_url = vectors["base_url"].as_str().unwrap();
    let client = HttpClient::new(Capture::default(), Some(base_url), ClientConfig::default());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let path = case["path"].as_str().unwrap();
        let mut config = RequestConfig::new();
        config.data = payload(&case["payload"]);

        let result: HttpResult<Value, Value> = match case["method"].as_str().unwrap() {
            "get" => client.get(path, Some(config)).await,
            "post" => client.post(path, Some(config)).await,
            "put" => client.put(path, Some(config)).await,
            "patch" => client.patch(path, Some(config)).await,
            "del" => client.del(path, Some(config)).await,
            "head" => client.head(path, Some(config)).await,
            other => panic!("unknown method: {other}"),
        };
        assert!(result.is_success(), "{name}: call failed");

        let (url, init) = client.transport().last.lock().unwrap().take().unwrap();
        let expected = &case["expected_request"];
        assert_eq!(init.method.as_str(), expected["method"].as_str().unwrap(), "{name}: method");
        assert_eq!(url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(describe(init.body), expected["body"], "{name}: body");
    }
}

#[tokio::test]
async fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];

        let outcome = if sim.is_null() {
            let message = case["transport_error"].as_str().unwrap().to_string();
            Outcome::Failed(TransportError::Connect(message))
        } else {
            Outcome::Response(HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            })
        };

        let result: HttpResult<Value, Value> = normalize(outcome).await;
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            case["expected_result"],
            "{name}: normalized result"
        );
    }
}
