//! The upstream call.
//!
//! [`forward`] sends one request to one upstream through the shared
//! hyper client and collects the full response. Redirects are never
//! followed (the legacy client has no redirect support), so 3xx
//! responses reach the rewriters untouched. Nothing is retried.

use std::time::{Duration, Instant};

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::error::ProxyError;
use crate::server::HttpClient;

/// A request body as understood by the forwarder.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Parsed JSON; re-serialized before sending.
    Json(serde_json::Value),
    /// Sent byte-for-byte with its original content type.
    Raw {
        bytes: Bytes,
        content_type: Option<HeaderValue>,
    },
}

impl RequestBody {
    /// Interpret an inbound body by its `Content-Type`.
    ///
    /// JSON bodies are parsed (blank ones become `{}`); if parsing fails
    /// the raw text is forwarded instead of rejecting the request. Other
    /// non-empty bodies are kept raw. Returns `None` for an empty,
    /// non-JSON body.
    #[must_use]
    pub fn from_inbound(headers: &HeaderMap, body: Bytes) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE).cloned();
        let is_json = content_type
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

        if is_json {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Some(Self::Json(serde_json::Value::Object(serde_json::Map::new())));
            }
            match serde_json::from_slice(&body) {
                Ok(value) => return Some(Self::Json(value)),
                Err(source) => {
                    let err = ProxyError::MalformedRequestBody { source };
                    tracing::warn!(error = %err, "forwarding unparsed request body");
                }
            }
        } else if body.is_empty() {
            return None;
        }

        Some(Self::Raw {
            bytes: body,
            content_type,
        })
    }
}

/// Everything needed for one upstream call.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// `<upstream>/<remainder>[?<query>]`, query copied verbatim.
#[must_use]
pub fn upstream_url(upstream: &str, remainder: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{upstream}/{remainder}?{q}"),
        None => format!("{upstream}/{remainder}"),
    }
}

/// Attach the body to the outgoing headers and produce the wire bytes.
///
/// `GET` and `HEAD` never carry a body.
fn prepare_body(method: &Method, headers: &mut HeaderMap, body: Option<RequestBody>) -> Bytes {
    if *method == Method::GET || *method == Method::HEAD {
        return Bytes::new();
    }
    match body {
        Some(RequestBody::Json(value)) => {
            let text = value.to_string();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(text.len()));
            Bytes::from(text)
        }
        Some(RequestBody::Raw {
            bytes,
            content_type,
        }) => {
            if let Some(ct) = content_type {
                headers.insert(CONTENT_TYPE, ct);
            }
            bytes
        }
        None => Bytes::new(),
    }
}

#[allow(clippy::cast_possible_truncation)]
pub async fn forward(
    client: &HttpClient,
    request: UpstreamRequest,
) -> Result<UpstreamResponse, ProxyError> {
    let UpstreamRequest {
        method,
        url,
        mut headers,
        body,
        timeout,
    } = request;

    let fail = |message: String| ProxyError::UpstreamUnreachable {
        url: url.clone(),
        message,
    };

    let body = prepare_body(&method, &mut headers, body);

    let mut req_builder = hyper::Request::builder().method(method).uri(url.as_str());
    for (key, value) in &headers {
        req_builder = req_builder.header(key, value);
    }
    let req = req_builder
        .body(Full::new(body))
        .map_err(|e| fail(e.to_string()))?;

    let start = Instant::now();
    let response = tokio::time::timeout(timeout, client.request(req))
        .await
        .map_err(|_| fail(format!("request timed out after {}ms", timeout.as_millis())))?
        .map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| fail(format!("body read error: {e}")))?
        .to_bytes();

    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        bytes = body.len(),
        "upstream responded"
    );

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        h
    }

    #[test]
    fn url_without_query() {
        assert_eq!(
            upstream_url("https://cms.example.com", "a/b", None),
            "https://cms.example.com/a/b"
        );
        assert_eq!(
            upstream_url("https://cms.example.com", "", Some("")),
            "https://cms.example.com/"
        );
    }

    #[test]
    fn url_keeps_query_verbatim() {
        assert_eq!(
            upstream_url("https://cms.example.com", "search", Some("b=2&a=1&b=3&q=a%20b")),
            "https://cms.example.com/search?b=2&a=1&b=3&q=a%20b"
        );
    }

    #[test]
    fn json_body_is_parsed() {
        let body = RequestBody::from_inbound(&json_headers(), Bytes::from_static(br#"{"a": 1}"#));
        assert_eq!(body, Some(RequestBody::Json(serde_json::json!({"a": 1}))));
    }

    #[test]
    fn blank_json_body_becomes_empty_object() {
        let body = RequestBody::from_inbound(&json_headers(), Bytes::from_static(b"  "));
        assert_eq!(body, Some(RequestBody::Json(serde_json::json!({}))));
    }

    #[test]
    fn malformed_json_is_forwarded_raw() {
        let body = RequestBody::from_inbound(&json_headers(), Bytes::from_static(b"{oops"));
        assert!(matches!(
            body,
            Some(RequestBody::Raw { ref bytes, .. }) if &bytes[..] == b"{oops"
        ));
    }

    #[test]
    fn empty_non_json_body_is_absent() {
        assert_eq!(RequestBody::from_inbound(&HeaderMap::new(), Bytes::new()), None);
    }

    #[test]
    fn json_is_reserialized_with_fresh_length() {
        let mut headers = HeaderMap::new();
        let bytes = prepare_body(
            &Method::POST,
            &mut headers,
            Some(RequestBody::Json(serde_json::json!({"a": 1}))),
        );
        assert_eq!(&bytes[..], br#"{"a":1}"#);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "7");
    }

    #[test]
    fn raw_body_passes_through_with_its_type() {
        let mut headers = HeaderMap::new();
        let bytes = prepare_body(
            &Method::PUT,
            &mut headers,
            Some(RequestBody::Raw {
                bytes: Bytes::from_static(b"a=1&b=2"),
                content_type: Some(HeaderValue::from_static("application/x-www-form-urlencoded")),
            }),
        );
        assert_eq!(&bytes[..], b"a=1&b=2");
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert!(headers.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn get_and_head_send_no_body() {
        for method in [Method::GET, Method::HEAD] {
            let mut headers = HeaderMap::new();
            let bytes = prepare_body(
                &method,
                &mut headers,
                Some(RequestBody::Json(serde_json::json!({"a": 1}))),
            );
            assert!(bytes.is_empty());
            assert!(headers.is_empty());
        }
    }
}
