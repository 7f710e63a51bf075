//! `veil health`: probe a running instance.
//!
//! Sends `GET /health` to the given URL and prints the result as a
//! short summary or raw JSON.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::VeilError;
use crate::health::HealthResponse;

pub async fn execute(args: HealthArgs) -> Result<(), VeilError> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let uri: hyper::Uri = url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| VeilError::UriParse {
            source: Box::new(e),
        })?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| VeilError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(std::time::Duration::from_secs(10), client.request(req))
        .await
        .map_err(|_| VeilError::HttpRequest {
            source: "health check timed out after 10s".into(),
        })?
        .map_err(|e| VeilError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| VeilError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(VeilError::HealthCheckFailed(status));
    }

    let body_str = String::from_utf8_lossy(&body);
    if args.json {
        println!("{body_str}");
        return Ok(());
    }

    match serde_json::from_str::<HealthResponse>(&body_str) {
        Ok(health) => {
            println!("\u{2713} veil is {} ({})", health.status, args.url);
            println!("  version:  {}", health.version);
            println!("  uptime:   {}", format_uptime(health.uptime_seconds));
            println!("  domains:  {}", health.domains.join(", "));
            println!(
                "  requests: {} forwarded, {} failed",
                health.stats.requests_forwarded, health.stats.requests_failed
            );
        }
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{body_str}");
        }
    }

    Ok(())
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
