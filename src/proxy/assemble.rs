//! Turning an upstream response into the reply sent to the client.
//!
//! Cookies and `Location` are rewritten, framing headers are dropped,
//! and the body goes through the [`BodyRewriter`] when it is eligible.
//! A value that cannot be rewritten is logged and passed through as-is;
//! assembly itself never fails.

use axum::body::Body;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

use super::forward::UpstreamResponse;
use super::headers::{strip_response_hop_by_hop, HeaderValues};
use crate::error::ProxyError;
use crate::registry::RewriteContext;
use crate::rewrite::body::BodyRewriter;
use crate::rewrite::{cookie, location};

pub const CORRELATION_ID: &str = "x-correlation-id";

#[must_use]
pub fn assemble(
    upstream: UpstreamResponse,
    ctx: &RewriteContext<'_>,
    rewriter: &BodyRewriter,
    correlation_id: &str,
) -> Response {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = upstream;

    let body = match rewriter.rewrite(&headers, &body, ctx) {
        Ok(rewritten) => rewritten,
        Err(skip) => {
            tracing::debug!(
                correlation_id = %correlation_id,
                reason = %skip,
                "body passed through unmodified"
            );
            body
        }
    };

    let mut headers = rewrite_response_headers(headers, ctx);
    strip_response_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    set_correlation_id(&mut response, correlation_id);
    response
}

/// Rewrite `Set-Cookie` and `Location`; every other header is kept.
#[must_use]
pub fn rewrite_response_headers(mut headers: HeaderMap, ctx: &RewriteContext<'_>) -> HeaderMap {
    replace_header(&mut headers, &SET_COOKIE, |cookies| {
        cookie::rewrite_cookies(cookies, ctx.base.host())
    });
    replace_header(&mut headers, &LOCATION, |values| {
        HeaderValues::Single(location::rewrite_location_header(values, ctx))
    });
    headers
}

fn replace_header(
    headers: &mut HeaderMap,
    name: &HeaderName,
    rewrite: impl FnOnce(&HeaderValues) -> HeaderValues,
) {
    let values = match HeaderValues::from_map(headers, name) {
        Ok(Some(values)) => values,
        Ok(None) => return,
        Err(e) => {
            log_failure(name, e.to_string());
            return;
        }
    };

    let rewritten = rewrite(&values)
        .iter()
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>();

    match rewritten {
        Ok(new_values) => {
            headers.remove(name);
            for value in new_values {
                headers.append(name.clone(), value);
            }
        }
        Err(e) => log_failure(name, e.to_string()),
    }
}

fn log_failure(name: &HeaderName, reason: String) {
    let header = if *name == SET_COOKIE {
        "Set-Cookie"
    } else {
        "Location"
    };
    let err = ProxyError::RewriteFailure { header, reason };
    tracing::warn!(error = %err, "keeping upstream header value");
}

pub fn set_correlation_id(response: &mut Response, correlation_id: &str) {
    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_ID, val);
    }
}
