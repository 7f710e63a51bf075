//! `Set-Cookie` rewriting.
//!
//! Cookies must attach to the proxy host and keep flowing when the proxy
//! is embedded cross-site, so every cookie gets its `Domain` pointed at
//! the proxy, loses `Secure`, and carries exactly one `SameSite=None`.
//! The leading `name=value` pair is never touched.

use crate::proxy::headers::HeaderValues;

#[must_use]
pub fn rewrite_cookie(cookie: &str, proxy_host: &str) -> String {
    let mut segments = cookie.split(';');
    let pair = segments.next().unwrap_or_default();

    let mut out = vec![pair.to_string()];
    for attr in segments {
        let attr = attr.trim();
        if attr.is_empty() {
            continue;
        }
        let name = attr.split('=').next().unwrap_or_default().trim();
        if name.eq_ignore_ascii_case("domain") {
            out.push(format!("Domain={proxy_host}"));
        } else if name.eq_ignore_ascii_case("secure") || name.eq_ignore_ascii_case("samesite") {
            continue;
        } else {
            out.push(attr.to_string());
        }
    }
    out.push("SameSite=None".to_string());
    out.join("; ")
}

/// Rewrite every cookie independently, preserving order.
#[must_use]
pub fn rewrite_cookies(cookies: &HeaderValues, proxy_host: &str) -> HeaderValues {
    cookies.map(|c| rewrite_cookie(c, proxy_host))
}
