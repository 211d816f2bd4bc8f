use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Map a configured log level onto a tracing filter directive
///
/// Accepts the level names used in `superclaude.toml` and
/// `SUPERCLAUDE_LOG_LEVEL`, case-insensitively. Unknown names fall back to
/// `info`.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        "OFF" => "off",
        _ => "info",
    }
}

/// Initialize a tracing subscriber writing to stderr.
///
/// `RUST_LOG` wins over `log_level` when set. Stdout is left alone so
/// command output stays machine-readable.
pub fn init(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(log_level)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
