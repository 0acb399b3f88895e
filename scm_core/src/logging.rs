use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. `LOG_FORMAT`
/// (`json` or `pretty`) overrides the configured format. Output always goes
/// to stderr so stdout stays free for command output.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn initialize(config: &LoggingConfig) -> Result<(), TryInitError> {
    let level = config.level.parse().unwrap_or(tracing::Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    match format_override().unwrap_or(config.format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
}

fn format_override() -> Option<LogFormat> {
    let raw = std::env::var("LOG_FORMAT").ok()?;
    match raw.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "human" => Some(LogFormat::Pretty),
        _ => None,
    }
}
