use crate::error::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stdout subscriber filtered at `level`; `RUST_LOG` takes precedence.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_thread_names(true)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| Error::config(format!("failed to initialize logging: {}", e)))?;

    Ok(())
}
