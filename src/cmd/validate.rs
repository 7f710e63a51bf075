//! `veil validate`: check a configuration file for errors.
//!
//! On success prints the route table the proxy would serve, one
//! `/proxy/<alias>/*` entry per domain with its upstream, plus the
//! effective proxy settings. On failure lists every error found.

use serde_json::{json, Value};

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::Config;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::{ValidationError, VeilError};

pub fn execute(args: &ValidateArgs) -> Result<(), VeilError> {
    let path = &args.config;

    if !path.exists() {
        return Err(VeilError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    match (validation::validate(&config), &args.format) {
        (Ok(()), ValidateFormat::Text) => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
            Ok(())
        }
        (Ok(()), ValidateFormat::Json) => {
            println!("{}", valid_report(&config));
            Ok(())
        }
        (Err(errors), ValidateFormat::Text) => {
            eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
            for error in &errors {
                eprintln!("{error}");
            }
            Err(VeilError::ConfigValidation { errors })
        }
        (Err(errors), ValidateFormat::Json) => {
            println!("{}", invalid_report(&errors));
            Err(VeilError::ConfigValidation { errors })
        }
    }
}

/// Route table and effective settings of a config that passed validation.
#[must_use]
pub fn valid_report(config: &Config) -> Value {
    let routes: Vec<Value> = config
        .domains
        .iter()
        .map(|d| {
            json!({
                "alias": d.alias,
                "route": format!("/proxy/{}/*", d.alias),
                "upstream": d.upstream,
                "referer": format!("{}{}", d.upstream, config.proxy.referer_path),
            })
        })
        .collect();

    json!({
        "valid": true,
        "routes": routes,
        "proxy": {
            "base_url": config.proxy.base_url,
            "timeout_ms": config.proxy.timeout,
            "referer_path": config.proxy.referer_path,
        },
    })
}

/// Errors in the order found, plus the set of entries they touch so a
/// caller can tell which domains need fixing.
#[must_use]
pub fn invalid_report(errors: &[ValidationError]) -> Value {
    let mut entries: Vec<&str> = errors.iter().map(|e| e.entry.as_str()).collect();
    entries.dedup();

    let errors: Vec<Value> = errors
        .iter()
        .map(|e| {
            json!({
                "entry": e.entry,
                "field": e.field,
                "message": e.message,
                "suggestion": e.suggestion,
            })
        })
        .collect();

    json!({
        "valid": false,
        "entries": entries,
        "errors": errors,
    })
}
