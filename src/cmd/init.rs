//! `veil init`: generate a starter configuration file.
//!
//! Writes a YAML, JSON, or TOML config, either minimal or with every
//! setting spelled out.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::VeilError;

pub fn execute(args: &InitArgs) -> Result<(), VeilError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("veil.{}", args.format.extension())));

    if output.exists() {
        return Err(VeilError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# Veil config

domains:
  - alias: cms
    upstream: "https://cms.example.com"
"#;

const YAML_FULL: &str = r#"# Veil config
#
# Values under `proxy` are the defaults. Modify as needed.

proxy:
  # Externally visible origin written into rewritten URLs.
  # Defaults to http://localhost:<port>; --base-url overrides it.
  # base_url: "https://proxy.example.org"

  # Upstream timeout in milliseconds.
  timeout: 30000

  # Appended to the upstream URL to form the forwarded Referer.
  referer_path: "/cms"

# Each domain is reachable at /proxy/<alias>/...
# Upstreams must be https origins without a path or trailing slash.
domains:
  - alias: cms
    upstream: "https://cms.example.com"
  # - alias: www
  #   upstream: "https://www.example.com"
"#;

const JSON_MINIMAL: &str = r#"{
  "domains": [
    { "alias": "cms", "upstream": "https://cms.example.com" }
  ]
}
"#;

const JSON_FULL: &str = r#"{
  "proxy": {
    "base_url": "http://localhost:45678",
    "timeout": 30000,
    "referer_path": "/cms"
  },
  "domains": [
    { "alias": "cms", "upstream": "https://cms.example.com" },
    { "alias": "www", "upstream": "https://www.example.com" }
  ]
}
"#;

const TOML_MINIMAL: &str = r#"# Veil config

[[domains]]
alias = "cms"
upstream = "https://cms.example.com"
"#;

const TOML_FULL: &str = r#"# Veil config
#
# Values under [proxy] are the defaults. Uncomment and modify as needed.

[proxy]
# base_url = "https://proxy.example.org"
# timeout = 30000
# referer_path = "/cms"

[[domains]]
alias = "cms"
upstream = "https://cms.example.com"

# [[domains]]
# alias = "www"
# upstream = "https://www.example.com"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate;

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_templates_are_valid() {
        for full in [false, true] {
            let config = serde_yml::from_str(template(&ConfigFormat::Yaml, full)).unwrap();
            assert!(validate(&config).is_ok());
        }
    }

    #[test]
    fn json_templates_are_valid() {
        for full in [false, true] {
            let config = serde_json::from_str(template(&ConfigFormat::Json, full)).unwrap();
            assert!(validate(&config).is_ok());
        }
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_templates_are_valid() {
        for full in [false, true] {
            let config = toml::from_str(template(&ConfigFormat::Toml, full)).unwrap();
            assert!(validate(&config).is_ok());
        }
    }
}
