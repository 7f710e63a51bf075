//! Rewriting of upstream artifacts so they point back through the proxy.
//!
//! Each pass is a pure function of its input and a
//! [`RewriteContext`](crate::registry::RewriteContext):
//!
//! - [`cookie`] -- `Set-Cookie` attributes (`Domain`, `Secure`, `SameSite`).
//! - [`location`] -- `Location` headers on redirects.
//! - [`body`] -- URLs embedded in textual response bodies.
//!
//! URL-bearing values are first sorted into a [`UrlForm`] by [`classify`];
//! the passes then handle each form separately.

pub mod body;
pub mod cookie;
pub mod location;

/// The syntactic shape of a URL reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlForm<'a> {
    /// `http://` or `https://` followed by `authority` and the rest.
    Absolute { authority: &'a str, remainder: &'a str },
    /// `//host/...`, inheriting the scheme of the page.
    ProtocolRelative { host: &'a str, remainder: &'a str },
    /// Single leading `/`.
    RootRelative(&'a str),
    Relative(&'a str),
}

#[must_use]
pub fn classify(value: &str) -> UrlForm<'_> {
    if let Some(rest) = strip_http_scheme(value) {
        let (authority, remainder) = split_authority(rest);
        return UrlForm::Absolute {
            authority,
            remainder,
        };
    }
    if let Some(rest) = value.strip_prefix("//") {
        let (host, remainder) = split_authority(rest);
        return UrlForm::ProtocolRelative { host, remainder };
    }
    if value.starts_with('/') {
        UrlForm::RootRelative(value)
    } else {
        UrlForm::Relative(value)
    }
}

fn strip_http_scheme(value: &str) -> Option<&str> {
    ["https://", "http://"].iter().find_map(|scheme| {
        value
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &value[scheme.len()..])
    })
}

/// Split `host[:port]` from whatever follows it (`/`, `?` or `#`).
fn split_authority(rest: &str) -> (&str, &str) {
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest.split_at(end)
}
