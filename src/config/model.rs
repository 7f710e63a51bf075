//! Serde data structures for the Veil configuration file.
//!
//! Contains [`Config`] (the root), [`ProxySettings`], and [`Domain`].
//! All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing.

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    30_000
}

fn default_referer_path() -> String {
    "/cms".to_string()
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_referer_path(v: &str) -> bool {
    v == "/cms"
}

fn is_default_proxy(v: &ProxySettings) -> bool {
    v.base_url.is_none()
        && is_default_timeout(&v.timeout)
        && is_default_referer_path(&v.referer_path)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_default_proxy")]
    pub proxy: ProxySettings,

    pub domains: Vec<Domain>,
}

impl Config {
    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.alias.as_str()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxySettings {
    /// Externally visible origin of the proxy. Derived from the listen
    /// port when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Upstream timeout in milliseconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    /// Path appended to the upstream base URL to form the forwarded `Referer`.
    #[serde(
        default = "default_referer_path",
        skip_serializing_if = "is_default_referer_path"
    )]
    pub referer_path: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: default_timeout(),
            referer_path: default_referer_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Domain {
    pub alias: String,
    pub upstream: String,
}
