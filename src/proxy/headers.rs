//! Header sanitizing for upstream requests and hop-by-hop stripping for
//! responses.
//!
//! [`sanitize_request_headers`] removes everything that identifies the
//! client connection or the proxy chain before a request goes upstream,
//! then pins `Referer` to the upstream itself. [`HeaderValues`] models
//! repeatable headers such as `Set-Cookie` and `Location`.

use std::sync::LazyLock;

use axum::http::header::{CONTENT_LENGTH, REFERER};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Headers that reveal the client, the proxy chain, or describe a body
/// that the forwarder may re-serialize.
static IDENTIFYING: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "forwarded",
        "via",
        "x-real-ip",
        "x-scheme",
        "host",
        "origin",
        "content-type",
        "content-length",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// One or many values of a header that may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValues {
    /// Collect every value of `name`, in order. `Ok(None)` when absent;
    /// `Err` when any value is not visible ASCII.
    pub fn from_map(
        headers: &HeaderMap,
        name: &HeaderName,
    ) -> Result<Option<Self>, axum::http::header::ToStrError> {
        let mut values = headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match values.len() {
            0 => None,
            1 => values.pop().map(Self::Single),
            _ => Some(Self::Multiple(values)),
        })
    }

    /// The first value; a `Multiple` is never empty when built by
    /// [`from_map`](Self::from_map).
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            Self::Single(v) => v,
            Self::Multiple(vs) => vs.first().map_or("", String::as_str),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Multiple(vs) => vs,
        };
        slice.iter().map(String::as_str)
    }

    #[must_use]
    pub fn map(&self, mut f: impl FnMut(&str) -> String) -> Self {
        match self {
            Self::Single(v) => Self::Single(f(v)),
            Self::Multiple(vs) => Self::Multiple(vs.iter().map(|v| f(v)).collect()),
        }
    }
}

/// Strip hop-by-hop headers and `content-length` from an upstream response.
///
/// The body has been fully collected and possibly rewritten, so the
/// origin's framing headers no longer describe it. Axum sets the
/// correct `content-length` from the final body.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(CONTENT_LENGTH);
}

/// Build the header map sent upstream.
///
/// Drops hop-by-hop headers, `Forwarded`, every `X-Forwarded-*`, `Via`,
/// `X-Real-Ip`, `X-Scheme`, `Host`, `Origin`, `Content-Type` and
/// `Content-Length`, then sets `Referer` to `<upstream><referer_path>`.
#[must_use]
pub fn sanitize_request_headers(original: &HeaderMap, upstream: &str, referer_path: &str) -> HeaderMap {
    let mut headers = original.clone();

    for name in HOP_BY_HOP.iter().chain(IDENTIFYING.iter()) {
        headers.remove(name);
    }

    let forwarded: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("x-forwarded-"))
        .cloned()
        .collect();
    for name in forwarded {
        headers.remove(name);
    }

    match HeaderValue::from_str(&format!("{upstream}{referer_path}")) {
        Ok(val) => {
            headers.insert(REFERER, val);
        }
        Err(e) => {
            tracing::warn!(upstream = %upstream, error = %e, "invalid referer value, dropping header");
            headers.remove(REFERER);
        }
    }

    headers
}
