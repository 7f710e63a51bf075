//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as an empty registry, malformed or duplicate aliases,
//! non-https upstreams, trailing slashes, and a bad proxy base URL.
//! Returns a list of [`ValidationError`] values with per-field suggestions.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate a domain alias. Returns `Ok(())` or a human-readable error.
pub fn validate_alias(alias: &str) -> Result<(), String> {
    if alias.is_empty() {
        return Err("alias cannot be empty".into());
    }
    if alias.contains('/') {
        return Err(format!("alias '{alias}' must not contain '/'"));
    }
    if alias.chars().any(char::is_whitespace) {
        return Err(format!("alias '{alias}' must not contain whitespace"));
    }
    Ok(())
}

/// Validate an upstream base URL: `https://host[:port]`, nothing after it.
pub fn validate_upstream(upstream: &str) -> Result<(), String> {
    if upstream.ends_with('/') {
        return Err("upstream must not end with '/'".into());
    }
    let parsed = Url::parse(upstream).map_err(|_| format!("'{upstream}' is not a valid URL"))?;
    if parsed.scheme() != "https" {
        return Err(format!(
            "unsupported scheme '{}' (upstreams must use https)",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none() {
        return Err(format!("'{upstream}' has no host"));
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("upstream must be an origin without path, query, or fragment".into());
    }
    Ok(())
}

/// Validate the proxy base URL: `http(s)://host[:port]` without trailing slash.
pub fn validate_base_url(base_url: &str) -> Result<(), String> {
    if base_url.ends_with('/') {
        return Err("base URL must not end with '/'".into());
    }
    let parsed = Url::parse(base_url).map_err(|_| format!("'{base_url}' is not a valid URL"))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().is_none() {
        return Err(format!("'{base_url}' has no host"));
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(ref base_url) = config.proxy.base_url {
        if let Err(msg) = validate_base_url(base_url) {
            errors.push(ValidationError {
                entry: "proxy".into(),
                field: "base_url".into(),
                message: msg,
                suggestion: base_url
                    .strip_suffix('/')
                    .map(|trimmed| format!("did you mean '{trimmed}'?")),
            });
        }
    }

    if !config.proxy.referer_path.starts_with('/') {
        errors.push(ValidationError {
            entry: "proxy".into(),
            field: "referer_path".into(),
            message: "referer_path must start with '/'".into(),
            suggestion: Some(format!("did you mean '/{}'?", config.proxy.referer_path)),
        });
    }

    if config.proxy.timeout == 0 {
        errors.push(ValidationError {
            entry: "proxy".into(),
            field: "timeout".into(),
            message: "timeout must be greater than zero".into(),
            suggestion: None,
        });
    }

    if config.domains.is_empty() {
        errors.push(ValidationError {
            entry: "(root)".into(),
            field: "domains".into(),
            message: "at least one domain must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_aliases = std::collections::HashSet::new();

    for (i, domain) in config.domains.iter().enumerate() {
        let entry_id = if domain.alias.is_empty() {
            format!("domains[{i}]")
        } else {
            domain.alias.clone()
        };

        if let Err(msg) = validate_alias(&domain.alias) {
            errors.push(ValidationError {
                entry: entry_id.clone(),
                field: "alias".into(),
                message: msg,
                suggestion: None,
            });
        }

        if !seen_aliases.insert(&domain.alias) {
            errors.push(ValidationError {
                entry: entry_id.clone(),
                field: "alias".into(),
                message: "duplicate alias".into(),
                suggestion: None,
            });
        }

        if let Err(msg) = validate_upstream(&domain.upstream) {
            let suggestion = if let Some(trimmed) = domain.upstream.strip_suffix('/') {
                Some(format!("did you mean '{trimmed}'?"))
            } else {
                domain
                    .upstream
                    .strip_prefix("http://")
                    .map(|rest| format!("did you mean 'https://{rest}'?"))
            };
            errors.push(ValidationError {
                entry: entry_id,
                field: "upstream".into(),
                message: msg,
                suggestion,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!("  {} domains\n", config.domains.len())];

    for domain in &config.domains {
        lines.push(format!(
            "  /proxy/{}/*  -> {}",
            domain.alias, domain.upstream
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "  base url: {}",
        config
            .proxy
            .base_url
            .as_deref()
            .unwrap_or("(derived from listen port)")
    ));
    lines.push(format!("  timeout:  {}ms", config.proxy.timeout));
    lines.push(format!("  referer:  <upstream>{}", config.proxy.referer_path));

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Config, Domain, ProxySettings};

    fn domain(alias: &str, upstream: &str) -> Domain {
        Domain {
            alias: alias.into(),
            upstream: upstream.into(),
        }
    }

    fn minimal_config() -> Config {
        Config {
            proxy: ProxySettings::default(),
            domains: vec![domain("cms", "https://cms.example.com")],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn empty_domains_fails() {
        let config = Config {
            proxy: ProxySettings::default(),
            domains: vec![],
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one domain"));
    }

    #[test]
    fn duplicate_alias_fails() {
        let mut config = minimal_config();
        config
            .domains
            .push(domain("cms", "https://other.example.com"));
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message == "duplicate alias"));
    }

    #[test]
    fn aliases_are_case_sensitive() {
        let mut config = minimal_config();
        config.domains.push(domain("CMS", "https://other.example.com"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn trailing_slash_upstream_fails_with_suggestion() {
        let mut config = minimal_config();
        config.domains[0].upstream = "https://cms.example.com/".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean 'https://cms.example.com'?")));
    }

    #[test]
    fn plain_http_upstream_fails() {
        let mut config = minimal_config();
        config.domains[0].upstream = "http://cms.example.com".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("https")));
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean 'https://cms.example.com'?")));
    }

    #[test]
    fn upstream_with_path_fails() {
        let mut config = minimal_config();
        config.domains[0].upstream = "https://cms.example.com/app".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("origin")));
    }

    #[test]
    fn alias_with_slash_fails() {
        let mut config = minimal_config();
        config.domains[0].alias = "a/b".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "alias"));
    }

    #[test]
    fn invalid_base_url_fails() {
        let mut config = minimal_config();
        config.proxy.base_url = Some("localhost:45678".into());
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "base_url"));
    }

    #[test]
    fn referer_path_without_slash_fails() {
        let mut config = minimal_config();
        config.proxy.referer_path = "cms".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/cms'?")));
    }
}
