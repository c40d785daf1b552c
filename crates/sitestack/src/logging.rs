//! Tracing subscriber setup shared by the command-line tools.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Builds the filter: `RUST_LOG` when set and parseable, otherwise `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// Installs the global subscriber and routes `log` records into it.
///
/// Logs go to stderr so rendered documents can be piped from stdout.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let _ = tracing_log::LogTracer::init();

    let filter = env_filter(level);
    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false)),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    if result.is_err() {
        log::debug!("Global subscriber already installed");
    }
}
