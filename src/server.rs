//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, immutable state holding the
//! domain registry, compiled rewriters, HTTP client, stats, and uptime),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the connection-pooled hyper client,
//! and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::VeilError;
use crate::health::health_handler;
use crate::middleware;
use crate::proxy;
use crate::registry::{DomainRegistry, ProxyBaseUrl};
use crate::rewrite::body::BodyRewriter;

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub registry: DomainRegistry,
    pub base_url: ProxyBaseUrl,
    pub body_rewriter: BodyRewriter,
    pub http_client: HttpClient,
    pub referer_path: String,
    pub timeout: Duration,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    /// Compile the body patterns and build the client for `registry`.
    pub fn new(
        registry: DomainRegistry,
        base_url: ProxyBaseUrl,
        referer_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, VeilError> {
        Ok(Self {
            body_rewriter: BodyRewriter::new(&registry)?,
            registry,
            base_url,
            http_client: build_http_client(),
            referer_path: referer_path.into(),
            timeout,
            start_time: Instant::now(),
            stats: Stats::new(),
        })
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Both `ring` and `aws-lc-rs` may be compiled in through transitive
    // features; rustls cannot pick one on its own then.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/proxy/{alias}", any(proxy::proxy_handler))
        .route("/proxy/{alias}/", any(proxy::proxy_handler))
        .route("/proxy/{alias}/{*rest}", any(proxy::proxy_handler))
        .route(
            "/redirect-location/{alias}",
            get(proxy::redirect_location_handler),
        )
        .route(
            "/redirect-location/{alias}/",
            get(proxy::redirect_location_handler),
        )
        .route(
            "/redirect-location/{alias}/{*rest}",
            get(proxy::redirect_location_handler),
        )
        .fallback(proxy::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::cors))
                .layer(DefaultBodyLimit::max(max_body))
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
