//! The domain registry and the per-request rewrite context.
//!
//! [`DomainRegistry`] maps short aliases to upstream origins and is the
//! only source of truth for which domains the proxy will talk to. It is
//! built once at startup from the validated [`Config`] and shared
//! read-only through [`AppState`](crate::server::AppState), together with
//! the [`ProxyBaseUrl`] that every rewrite substitutes in.

use url::Url;

use crate::config::model::Config;
use crate::config::validation::validate_base_url;
use crate::error::{ProxyError, VeilError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    alias: String,
    upstream: String,
    authority: String,
}

impl DomainEntry {
    /// Trailing slashes on `upstream` are dropped.
    #[must_use]
    pub fn new(alias: impl Into<String>, upstream: impl Into<String>) -> Self {
        let mut upstream = upstream.into();
        while upstream.ends_with('/') {
            upstream.pop();
        }
        let authority = upstream
            .split_once("://")
            .map_or(upstream.as_str(), |(_, rest)| rest)
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            alias: alias.into(),
            upstream,
            authority,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Upstream base URL, e.g. `https://cms.example.com`.
    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// `host[:port]` of the upstream.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    entries: Vec<DomainEntry>,
}

impl DomainRegistry {
    /// Later entries reusing an alias are ignored.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = DomainEntry>) -> Self {
        let mut unique: Vec<DomainEntry> = Vec::new();
        for entry in entries {
            if unique.iter().any(|e| e.alias == entry.alias) {
                tracing::warn!(alias = %entry.alias, "duplicate alias ignored");
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .domains
                .iter()
                .map(|d| DomainEntry::new(d.alias.clone(), d.upstream.clone())),
        )
    }

    /// Exact, case-sensitive alias lookup.
    pub fn resolve(&self, alias: &str) -> Result<&DomainEntry, ProxyError> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .ok_or_else(|| ProxyError::InvalidDomain {
                alias: alias.to_string(),
            })
    }

    /// Find the entry whose upstream `host[:port]` equals `authority`,
    /// ignoring ASCII case.
    #[must_use]
    pub fn find_by_authority(&self, authority: &str) -> Option<&DomainEntry> {
        self.entries
            .iter()
            .find(|e| e.authority.eq_ignore_ascii_case(authority))
    }

    /// Like [`find_by_authority`](Self::find_by_authority), falling back to
    /// an exact alias match.
    #[must_use]
    pub fn find_by_host_or_alias(&self, host: &str) -> Option<&DomainEntry> {
        self.find_by_authority(host)
            .or_else(|| self.entries.iter().find(|e| e.alias == host))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.alias.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The externally visible origin of the proxy, e.g. `http://localhost:45678`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyBaseUrl {
    url: String,
    host: String,
}

impl ProxyBaseUrl {
    pub fn parse(raw: &str) -> Result<Self, VeilError> {
        validate_base_url(raw).map_err(|reason| VeilError::InvalidBaseUrl {
            url: raw.to_string(),
            reason,
        })?;
        let parsed = Url::parse(raw).map_err(|e| VeilError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| VeilError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "missing host".into(),
            })?
            .to_string();
        Ok(Self {
            url: raw.to_string(),
            host,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Bare host without port, used as the cookie `Domain`.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `<base>/proxy/<alias>`
    #[must_use]
    pub fn alias_root(&self, alias: &str) -> String {
        format!("{}/proxy/{alias}", self.url)
    }
}

impl std::fmt::Display for ProxyBaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Read-only view handed to every rewrite function for one request.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    pub alias: &'a str,
    pub upstream: &'a str,
    pub base: &'a ProxyBaseUrl,
    pub registry: &'a DomainRegistry,
}

impl<'a> RewriteContext<'a> {
    #[must_use]
    pub fn new(entry: &'a DomainEntry, base: &'a ProxyBaseUrl, registry: &'a DomainRegistry) -> Self {
        Self {
            alias: entry.alias(),
            upstream: entry.upstream(),
            base,
            registry,
        }
    }

    /// `<base>/proxy/<current alias>`
    #[must_use]
    pub fn current_root(&self) -> String {
        self.base.alias_root(self.alias)
    }
}
