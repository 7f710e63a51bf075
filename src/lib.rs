//! Veil is a rewriting reverse proxy.
//!
//! It exposes a fixed set of upstream origins under short aliases
//! (`/proxy/<alias>/...`) so a client never talks to, or sees, the real
//! hostnames. Requests are stripped of identifying headers before they go
//! upstream; cookies, redirects and textual bodies coming back are
//! rewritten so every URL points at the proxy again.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration loading and validation via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`error`] -- Process-level and per-request error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- CORS headers and preflight handling.
//! - [`proxy`] -- Request handlers, header sanitizing, the upstream call,
//!   and response assembly.
//! - [`registry`] -- The alias to upstream registry and the proxy base URL.
//! - [`rewrite`] -- Cookie, redirect, and body URL rewriting.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod registry;
pub mod rewrite;
pub mod server;
