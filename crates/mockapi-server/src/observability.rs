//! Structured logging setup and request outcome logging
//!
//! The subscriber is installed once by the binary. Filter directives from
//! `RUST_LOG` win over the configured level.

use std::time::{Duration, Instant};
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::ServerConfig;
use crate::resolver::ResolutionSource;

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(
    config: &ServerConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true);
        subscriber.with(json_layer).try_init()
    } else {
        let pretty_layer = fmt::layer().with_target(true);
        subscriber.with(pretty_layer).try_init()
    }
}

/// Per-request span and response logging for the router
pub fn http_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::DEBUG)
                .latency_unit(LatencyUnit::Millis),
        )
}

/// Timer for measuring resolution duration
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time since timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Log a request answered from a fixture or an expectation
pub fn log_resolved(
    method: &str,
    path: &str,
    source: ResolutionSource,
    status: u16,
    timer: &RequestTimer,
) {
    info!(
        method = %method,
        path = %path,
        source = ?source,
        status,
        elapsed_ms = timer.elapsed().as_millis(),
        "Resolved request"
    );
}

/// Log a request that could not be answered
pub fn log_unresolved(method: &str, path: &str, status: u16, timer: &RequestTimer) {
    debug!(
        method = %method,
        path = %path,
        status,
        elapsed_ms = timer.elapsed().as_millis(),
        "Request not resolved"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        let config = ServerConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
