//! # Tracing helpers
//!
//! Shared `tracing` initialization for the squidsearch binaries.

use error_stack::{Result, ResultExt};
use tracing::Subscriber;
use tracing_subscriber::{prelude::*, registry::LookupSpan, EnvFilter, Layer};

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Debug)]
pub struct InitTracingError;
impl error_stack::Context for InitTracingError {}

impl std::fmt::Display for InitTracingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("failed to initialize tracing")
    }
}

/// Initialize tracing.
///
/// Logs go to stdout, filtered by `RUST_LOG` (default `info`). Set
/// `RUST_LOG_FORMAT=json` for newline-delimited JSON output.
/// Call once during application startup.
pub fn init_tracing() -> Result<(), InitTracingError> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    tracing_subscriber::registry()
        .with(stdout())
        .try_init()
        .change_context(InitTracingError)?;

    Ok(())
}

fn stdout<S>() -> BoxedLayer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let log_env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO"));

    let json_fmt = std::env::var("RUST_LOG_FORMAT")
        .map(|val| val == "json")
        .unwrap_or(false);

    if json_fmt {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(log_env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_filter(log_env_filter)
            .boxed()
    }
}
