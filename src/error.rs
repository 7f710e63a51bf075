//! Unified error types for Veil.
//!
//! Defines [`VeilError`] (process-level failures: config loading, binding,
//! the health probe), [`ProxyError`] (the per-request taxonomy surfaced by
//! the proxy handlers), and [`ValidationError`] for config validation
//! failures. Error messages include contextual hints to guide the user
//! toward a fix.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub entry: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}: {}", self.entry, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VeilError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid proxy base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to compile rewrite pattern for '{alias}': {source}")]
    RewritePattern {
        alias: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Failures that belong to a single proxied request.
///
/// None of these are fatal to the process. `MalformedRequestBody` and
/// `RewriteFailure` are logged and recovered from in place; the other two
/// become error responses through [`IntoResponse`].
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("unknown domain alias '{alias}'")]
    InvalidDomain { alias: String },

    #[error("{message}")]
    UpstreamUnreachable { url: String, message: String },

    #[error("request body is not valid JSON: {source}")]
    MalformedRequestBody {
        #[source]
        source: serde_json::Error,
    },

    #[error("could not rewrite {header} header: {reason}")]
    RewriteFailure { header: &'static str, reason: String },
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidDomain { .. } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid domain" })),
            )
                .into_response(),
            Self::UpstreamUnreachable { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Proxy request failed",
                    "message": message,
                })),
            )
                .into_response(),
            // Recovered in place by the handlers; reaching here is a handler bug.
            Self::MalformedRequestBody { .. } | Self::RewriteFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
