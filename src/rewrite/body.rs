//! URL rewriting inside textual response bodies.
//!
//! This is syntactic, regex-based rewriting over HTML, script, CSS, and
//! JSON text. It catches literal references to the registered upstreams
//! and root-relative `href`/`src`/`action` attributes. URLs assembled at
//! runtime by client-side script, inline script logic, and CSS `url()`
//! references are not rewritten.
//!
//! A body is only touched when [`BodyRewriter::rewrite`] decides it is
//! safe: a known textual content type, no content coding, and bytes that
//! decode cleanly as UTF-8. Anything else is handed back untouched so
//! compressed or binary payloads are never corrupted.

use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::HeaderMap;
use bytes::Bytes;
use regex::{Captures, NoExpand, Regex};

use super::{classify, UrlForm};
use crate::error::VeilError;
use crate::registry::{DomainRegistry, RewriteContext};

/// Content types (substring match) whose bodies may carry URLs.
pub const TEXT_CONTENT_TYPES: &[&str] = &[
    "text/html",
    "application/javascript",
    "text/css",
    "application/json",
    "text/plain",
];

/// Why a body was passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    Empty,
    NotText,
    Encoded(String),
    Binary,
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty body"),
            Self::NotText => f.write_str("non-textual content type"),
            Self::Encoded(coding) => write!(f, "content-encoding {coding}"),
            Self::Binary => f.write_str("body does not decode as text"),
        }
    }
}

struct DomainPatterns {
    alias: String,
    absolute: Regex,
    protocol_relative: Regex,
}

/// Compiled patterns for every registered domain.
pub struct BodyRewriter {
    domains: Vec<DomainPatterns>,
    attribute: Regex,
}

impl BodyRewriter {
    pub fn new(registry: &DomainRegistry) -> Result<Self, VeilError> {
        let domains = registry
            .iter()
            .map(|entry| {
                let host = regex::escape(entry.authority());
                let compile = |pattern: String| {
                    Regex::new(&pattern).map_err(|source| VeilError::RewritePattern {
                        alias: entry.alias().to_string(),
                        source,
                    })
                };
                Ok::<_, VeilError>(DomainPatterns {
                    alias: entry.alias().to_string(),
                    absolute: compile(format!("https?://{host}"))?,
                    protocol_relative: compile(format!("//{host}"))?,
                })
            })
            .collect::<Result<Vec<_>, VeilError>>()?;

        let attribute = Regex::new(r#"(?P<attr>href|src|action)=["'](?P<url>/[^"']*)["']"#)
            .map_err(|source| VeilError::RewritePattern {
                alias: "(attributes)".into(),
                source,
            })?;

        Ok(Self { domains, attribute })
    }

    /// Rewrite an upstream body if it is eligible, otherwise say why not.
    pub fn rewrite(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        ctx: &RewriteContext<'_>,
    ) -> Result<Bytes, Skip> {
        if body.is_empty() {
            return Err(Skip::Empty);
        }
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !is_text_content(content_type) {
            return Err(Skip::NotText);
        }
        if let Some(coding) = content_coding(headers) {
            return Err(Skip::Encoded(coding));
        }
        let text = decode_text(body).ok_or(Skip::Binary)?;
        Ok(Bytes::from(self.rewrite_text(&text, ctx)))
    }

    /// Run the passes over already-decoded text.
    ///
    /// Per registered domain, absolute then protocol-relative references
    /// are pointed at that domain's alias; root-relative attributes are
    /// then pointed at the current alias.
    #[must_use]
    pub fn rewrite_text(&self, text: &str, ctx: &RewriteContext<'_>) -> String {
        let mut out = text.to_string();
        for domain in &self.domains {
            let replacement = ctx.base.alias_root(&domain.alias);
            out = domain
                .absolute
                .replace_all(&out, NoExpand(&replacement))
                .into_owned();
            out = domain
                .protocol_relative
                .replace_all(&out, NoExpand(&replacement))
                .into_owned();
        }

        let root = ctx.current_root();
        self.attribute
            .replace_all(&out, |caps: &Captures<'_>| match classify(&caps["url"]) {
                UrlForm::RootRelative(path) if !path.starts_with("/proxy") => {
                    format!("{}=\"{root}{path}\"", &caps["attr"])
                }
                _ => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[must_use]
pub fn is_text_content(content_type: &str) -> bool {
    TEXT_CONTENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// The response's content coding, if it is anything but identity.
#[must_use]
pub fn content_coding(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).trim().to_ascii_lowercase())
        .find(|coding| !coding.is_empty() && coding != "identity")
}

/// Decode as UTF-8, refusing anything that looks like misclassified binary.
#[must_use]
pub fn decode_text(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    if text.contains('\0') || text.contains('\u{FFFD}') {
        None
    } else {
        Some(text.into_owned())
    }
}
