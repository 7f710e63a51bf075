//! Integration tests for config loading across all file formats.

use veil::config::model::Config;
use veil::config::sources::file_source::FileSource;
use veil::config::sources::parse_config_str;
use veil::config::validation::validate;
use veil::config::{ConfigSource, ConfigVersion};
use veil::error::VeilError;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("veil.yaml");
    let config = parse_config_str("yaml", &content, "veil.yaml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.aliases(), vec!["cms", "www"]);
    assert_eq!(config.proxy.base_url.as_deref(), Some("http://localhost:45678"));
}

#[test]
fn minimal_example_uses_defaults() {
    let content = load_example("minimal.yaml");
    let config = parse_config_str("yaml", &content, "minimal.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.proxy.base_url.is_none());
    assert_eq!(config.proxy.timeout, 30_000);
    assert_eq!(config.proxy.referer_path, "/cms");
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("veil.json");
    let config = parse_config_str("json", &content, "veil.json").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.domains.len(), 2);
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("veil.toml");
    let config = parse_config_str("toml", &content, "veil.toml").unwrap();
    validate(&config).unwrap();
    assert_eq!(config.domains.len(), 2);
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml_config = parse_config_str("yaml", &load_example("veil.yaml"), "yaml").unwrap();
    let json_config = parse_config_str("json", &load_example("veil.json"), "json").unwrap();
    let toml_config = parse_config_str("toml", &load_example("veil.toml"), "toml").unwrap();

    assert_eq!(yaml_config.aliases(), json_config.aliases());
    assert_eq!(yaml_config.aliases(), toml_config.aliases());
    assert_eq!(yaml_config.proxy.timeout, toml_config.proxy.timeout);
    assert_eq!(yaml_config.domains[0].upstream, json_config.domains[0].upstream);
}

#[tokio::test]
async fn file_source_hashes_content() {
    let source = FileSource::yaml("example/veil.yaml".into());
    let (config, version) = source.load().await.unwrap();
    assert_eq!(config.domains.len(), 2);
    let ConfigVersion::Hash(hash) = version else {
        panic!("expected a content hash");
    };
    assert_eq!(hash.len(), 64);
}

#[tokio::test]
async fn missing_file_is_reported() {
    let source = FileSource::yaml("example/does-not-exist.yaml".into());
    assert!(matches!(
        source.load().await,
        Err(VeilError::ConfigFileNotFound { .. })
    ));
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(result.is_err());
}

#[test]
fn empty_domain_list_fails_validation() {
    let config: Config = serde_json::from_str(r#"{"domains": []}"#).unwrap();
    assert!(validate(&config).is_err());
}

#[test]
fn plain_http_upstream_fails_validation() {
    let json = r#"{"domains": [{"alias": "cms", "upstream": "http://cms.example.com"}]}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let errors = validate(&config).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "upstream");
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{"domains": [], "routes": []}"#;
    assert!(serde_json::from_str::<Config>(json).is_err());
}
