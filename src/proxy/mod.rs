//! Proxy request handlers.
//!
//! [`proxy_handler`] serves `/proxy/:alias/*`: it resolves the alias
//! against the registry, sanitizes headers, forwards upstream, and
//! assembles the rewritten reply. [`redirect_location_handler`] serves
//! `/redirect-location/:alias/*` and reports an upstream's raw
//! `Location` without rewriting it. Submodules hold header handling
//! ([`headers`]), the upstream call ([`forward`]), and response
//! assembly ([`assemble`]).

pub mod assemble;
pub mod forward;
pub mod headers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::registry::RewriteContext;
use crate::server::AppState;
use forward::{RequestBody, UpstreamRequest};

pub const PROXY_PREFIX: &str = "/proxy/";
pub const REDIRECT_LOCATION_PREFIX: &str = "/redirect-location/";

/// Split `<prefix><alias>[/<remainder>]` into alias and remainder.
///
/// The remainder keeps its percent-encoding and has no leading slash.
#[must_use]
pub fn split_alias_path<'a>(path: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = path.strip_prefix(prefix)?;
    Some(rest.split_once('/').unwrap_or((rest, "")))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(assemble::CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = correlation_id(&req_headers);
    let Some((alias, remainder)) = split_alias_path(uri.path(), PROXY_PREFIX) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let entry = match state.registry.resolve(alias) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                method = %method,
                error = %e,
                "rejected request for unknown domain"
            );
            let mut response = e.into_response();
            assemble::set_correlation_id(&mut response, &correlation_id);
            return response;
        }
    };

    let url = forward::upstream_url(entry.upstream(), remainder, uri.query());
    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        alias = %alias,
        path = %remainder,
        "request received"
    );

    let request = UpstreamRequest {
        headers: headers::sanitize_request_headers(
            &req_headers,
            entry.upstream(),
            &state.referer_path,
        ),
        body: RequestBody::from_inbound(&req_headers, body),
        method,
        url,
        timeout: state.timeout,
    };

    match forward::forward(&state.http_client, request).await {
        Ok(upstream) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                alias = %alias,
                status = upstream.status.as_u16(),
                "upstream responded"
            );
            let ctx = RewriteContext::new(entry, &state.base_url, &state.registry);
            assemble::assemble(upstream, &ctx, &state.body_rewriter, &correlation_id)
        }
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                correlation_id = %correlation_id,
                alias = %alias,
                error = %e,
                "proxy request failed"
            );
            let mut response = e.into_response();
            assemble::set_correlation_id(&mut response, &correlation_id);
            response
        }
    }
}

pub async fn redirect_location_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    req_headers: HeaderMap,
) -> Response {
    let Some((alias, remainder)) = split_alias_path(uri.path(), REDIRECT_LOCATION_PREFIX) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let entry = match state.registry.resolve(alias) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(error = %e, "rejected redirect lookup for unknown domain");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let request = UpstreamRequest {
        method: Method::GET,
        url: forward::upstream_url(entry.upstream(), remainder, uri.query()),
        headers: headers::sanitize_request_headers(
            &req_headers,
            entry.upstream(),
            &state.referer_path,
        ),
        body: None,
        timeout: state.timeout,
    };

    match forward::forward(&state.http_client, request).await {
        Ok(upstream) => {
            let location = upstream
                .headers
                .get(LOCATION)
                .map(|v| Bytes::copy_from_slice(v.as_bytes()))
                .unwrap_or_default();
            let mut response = Response::new(Body::from(location));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            response
        }
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(alias = %alias, error = %e, "redirect lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_alias_and_remainder() {
        assert_eq!(
            split_alias_path("/proxy/cms/a/b%20c", PROXY_PREFIX),
            Some(("cms", "a/b%20c"))
        );
    }

    #[test]
    fn alias_without_remainder() {
        assert_eq!(split_alias_path("/proxy/cms", PROXY_PREFIX), Some(("cms", "")));
        assert_eq!(split_alias_path("/proxy/cms/", PROXY_PREFIX), Some(("cms", "")));
    }

    #[test]
    fn other_prefixes_do_not_match() {
        assert_eq!(split_alias_path("/health", PROXY_PREFIX), None);
        assert_eq!(
            split_alias_path("/redirect-location/www/x", REDIRECT_LOCATION_PREFIX),
            Some(("www", "x"))
        );
    }
}
