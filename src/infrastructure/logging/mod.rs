// Logging module - Logging infrastructure
use crate::domain::error::{EchoError, EchoResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging to stderr, leaving stdout to the session console.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) -> EchoResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("echoline={},warn", level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| EchoError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    tracing::debug!("echoline logging system initialized");
    Ok(())
}
