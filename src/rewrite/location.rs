//! `Location` header rewriting for redirects.
//!
//! The value is classified once and handled per [`UrlForm`]:
//! absolute and protocol-relative URLs are rewritten only when they name
//! a registered upstream, root-relative and relative ones always belong
//! to the upstream currently being proxied.

use super::{classify, UrlForm};
use crate::proxy::headers::HeaderValues;
use crate::registry::RewriteContext;

#[must_use]
pub fn rewrite_location(location: &str, ctx: &RewriteContext<'_>) -> String {
    match classify(location) {
        UrlForm::Absolute {
            authority,
            remainder,
        } => ctx.registry.find_by_authority(authority).map_or_else(
            || location.to_string(),
            |entry| format!("{}{remainder}", ctx.base.alias_root(entry.alias())),
        ),
        UrlForm::ProtocolRelative { host, remainder } => {
            ctx.registry.find_by_host_or_alias(host).map_or_else(
                || location.to_string(),
                |entry| format!("{}{remainder}", ctx.base.alias_root(entry.alias())),
            )
        }
        UrlForm::RootRelative(path) => format!("{}{path}", ctx.current_root()),
        UrlForm::Relative(path) => format!("{}/{path}", ctx.current_root()),
    }
}

/// Only the first value of a repeated `Location` header is meaningful.
#[must_use]
pub fn rewrite_location_header(values: &HeaderValues, ctx: &RewriteContext<'_>) -> String {
    rewrite_location(values.first(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DomainEntry, DomainRegistry, ProxyBaseUrl};

    fn fixtures() -> (DomainRegistry, ProxyBaseUrl) {
        (
            DomainRegistry::new([
                DomainEntry::new("cms", "https://cms.example.com"),
                DomainEntry::new("www", "https://www.example.com"),
            ]),
            ProxyBaseUrl::parse("http://localhost:45678").unwrap(),
        )
    }

    fn rewrite(location: &str, alias: &str) -> String {
        let (registry, base) = fixtures();
        let entry = registry.resolve(alias).unwrap();
        let ctx = RewriteContext::new(entry, &base, &registry);
        rewrite_location(location, &ctx)
    }

    #[test]
    fn absolute_registered_upstream() {
        assert_eq!(
            rewrite("https://cms.example.com/login", "cms"),
            "http://localhost:45678/proxy/cms/login"
        );
    }

    #[test]
    fn absolute_uses_the_matching_alias_not_the_current_one() {
        assert_eq!(
            rewrite("https://www.example.com/home?x=1", "cms"),
            "http://localhost:45678/proxy/www/home?x=1"
        );
    }

    #[test]
    fn absolute_match_is_scheme_agnostic() {
        assert_eq!(
            rewrite("http://cms.example.com/a", "cms"),
            "http://localhost:45678/proxy/cms/a"
        );
    }

    #[test]
    fn absolute_third_party_unchanged() {
        assert_eq!(
            rewrite("https://other.example.com/x", "cms"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn absolute_lookalike_host_unchanged() {
        assert_eq!(
            rewrite("https://cms.example.com.evil.test/x", "cms"),
            "https://cms.example.com.evil.test/x"
        );
    }

    #[test]
    fn protocol_relative_registered_upstream() {
        assert_eq!(
            rewrite("//cms.example.com/dash", "cms"),
            "http://localhost:45678/proxy/cms/dash"
        );
    }

    #[test]
    fn protocol_relative_unknown_host_unchanged() {
        assert_eq!(rewrite("//cdn.test/app.js", "cms"), "//cdn.test/app.js");
    }

    #[test]
    fn root_relative_uses_current_alias() {
        assert_eq!(rewrite("/dash", "cms"), "http://localhost:45678/proxy/cms/dash");
        assert_eq!(rewrite("/dash", "www"), "http://localhost:45678/proxy/www/dash");
    }

    #[test]
    fn relative_joins_under_current_alias() {
        assert_eq!(rewrite("next", "cms"), "http://localhost:45678/proxy/cms/next");
    }

    #[test]
    fn header_uses_first_value() {
        let (registry, base) = fixtures();
        let entry = registry.resolve("cms").unwrap();
        let ctx = RewriteContext::new(entry, &base, &registry);
        let values = HeaderValues::Multiple(vec!["/first".into(), "/second".into()]);
        assert_eq!(
            rewrite_location_header(&values, &ctx),
            "http://localhost:45678/proxy/cms/first"
        );
    }
}
