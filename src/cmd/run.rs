//! `veil run`: start the proxy server.
//!
//! Loads the configuration file once, builds the domain registry and
//! rewriters, and serves the Axum router until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config::sources::file_source::FileSource;
use crate::config::ConfigSource;
use crate::error::VeilError;
use crate::logging;
use crate::registry::{DomainRegistry, ProxyBaseUrl};
use crate::server::{self, AppState};

const CANDIDATES: [&str; 4] = ["veil.yaml", "veil.yml", "veil.json", "veil.toml"];

pub async fn execute(args: RunArgs) -> Result<(), VeilError> {
    logging::init(&args.log_level, logging::resolve_format(args.pretty, args.json));

    let source = resolve_file_source(args.config.as_deref()).await?;
    let (config, version) = source.load().await?;

    let base_url = ProxyBaseUrl::parse(&resolve_base_url(
        args.base_url.as_deref(),
        config.proxy.base_url.as_deref(),
        args.port,
    ))?;
    let timeout = Duration::from_millis(args.timeout.unwrap_or(config.proxy.timeout));

    let registry = DomainRegistry::from_config(&config);
    let aliases = registry.aliases().join(",");
    let state = Arc::new(AppState::new(
        registry,
        base_url,
        config.proxy.referer_path.clone(),
        timeout,
    )?);
    let health_url = format!("{}/health", state.base_url);

    let router = server::build_router(Arc::clone(&state), args.max_body);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        base_url = %state.base_url,
        domains = %aliases,
        config_source = source.name(),
        config_version = version.short(),
        health = %health_url,
        "veil started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("veil stopped");
    Ok(())
}

/// `--base-url` wins over the config file, which wins over the port default.
#[must_use]
pub fn resolve_base_url(cli: Option<&str>, config: Option<&str>, port: u16) -> String {
    cli.or(config)
        .map_or_else(|| format!("http://localhost:{port}"), String::from)
}

async fn resolve_file_source(
    explicit: Option<&Path>,
) -> Result<Box<dyn ConfigSource>, VeilError> {
    if let Some(path) = explicit {
        return create_file_source(path);
    }

    for name in &CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    Err(VeilError::NoConfigSource {
        hint: "Provide --config <file> or place veil.yaml in the working directory.\n  \
               Run 'veil init' to create a config file."
            .into(),
    })
}

pub fn create_file_source(path: &Path) -> Result<Box<dyn ConfigSource>, VeilError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(FileSource::yaml(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(FileSource::json(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(FileSource::toml(path.to_path_buf()))),

        other => Err(VeilError::UnsupportedFormat(other.to_string())),
    }
}
