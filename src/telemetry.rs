//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,reading=debug,jianhua_backend=debug,tower_http=info,axum=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used across the crate:
//! - `jianhua_backend`: startup, sessions, model client
//! - `reading`: selection engine transitions
//! - `quiz`, `culture`, `tutor`: the auxiliary activities

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,reading=debug,quiz=info,culture=info,tutor=info,jianhua_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The json and pretty builders are different types, so init in each arm.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
