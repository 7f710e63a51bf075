//! Rewriting behavior through the public API, using the alias `cms`
//! for `https://cms.example.com` behind `http://localhost:45678`.

use veil::registry::{DomainEntry, DomainRegistry, ProxyBaseUrl, RewriteContext};
use veil::rewrite::body::BodyRewriter;
use veil::rewrite::cookie::rewrite_cookie;
use veil::rewrite::location::rewrite_location;

fn registry() -> DomainRegistry {
    DomainRegistry::new([
        DomainEntry::new("cms", "https://cms.example.com"),
        DomainEntry::new("www", "https://www.example.com"),
    ])
}

fn base() -> ProxyBaseUrl {
    ProxyBaseUrl::parse("http://localhost:45678").unwrap()
}

#[test]
fn redirect_cases() {
    let registry = registry();
    let base = base();
    let ctx = RewriteContext::new(registry.resolve("cms").unwrap(), &base, &registry);

    let cases = [
        (
            "https://cms.example.com/login",
            "http://localhost:45678/proxy/cms/login",
        ),
        (
            "//cms.example.com/dash",
            "http://localhost:45678/proxy/cms/dash",
        ),
        ("/dash", "http://localhost:45678/proxy/cms/dash"),
        ("next", "http://localhost:45678/proxy/cms/next"),
        ("https://other.example.com/x", "https://other.example.com/x"),
        (
            "https://www.example.com/home",
            "http://localhost:45678/proxy/www/home",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(rewrite_location(input, &ctx), expected, "location {input}");
    }
}

#[test]
fn body_attributes_follow_the_current_alias() {
    let registry = registry();
    let base = base();
    let rewriter = BodyRewriter::new(&registry).unwrap();

    let cms = RewriteContext::new(registry.resolve("cms").unwrap(), &base, &registry);
    let www = RewriteContext::new(registry.resolve("www").unwrap(), &base, &registry);

    assert_eq!(
        rewriter.rewrite_text(r#"<a href="/page">"#, &cms),
        r#"<a href="http://localhost:45678/proxy/cms/page">"#
    );
    assert_eq!(
        rewriter.rewrite_text(r#"<a href="/page">"#, &www),
        r#"<a href="http://localhost:45678/proxy/www/page">"#
    );
    assert_eq!(
        rewriter.rewrite_text(r#"<a href="/proxy/cms/page">"#, &cms),
        r#"<a href="/proxy/cms/page">"#
    );
}

#[test]
fn body_rewriting_is_stable_on_its_own_output() {
    let registry = registry();
    let base = base();
    let rewriter = BodyRewriter::new(&registry).unwrap();
    let ctx = RewriteContext::new(registry.resolve("cms").unwrap(), &base, &registry);

    let html = r#"<a href="/a"><img src="//www.example.com/i.png"><script src="https://cms.example.com/app.js">"#;
    let once = rewriter.rewrite_text(html, &ctx);
    assert_eq!(rewriter.rewrite_text(&once, &ctx), once);
}

#[test]
fn cookie_rewrite_never_duplicates_samesite() {
    let once = rewrite_cookie("sid=1; Domain=cms.example.com; Secure; SameSite=Lax", "localhost");
    let twice = rewrite_cookie(&once, "localhost");
    assert_eq!(twice, "sid=1; Domain=localhost; SameSite=None");
}

#[test]
fn unknown_alias_does_not_resolve() {
    assert!(registry().resolve("nope").is_err());
}
