//! Subscriber setup for binaries. Libraries only emit `tracing` events.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install a global `fmt` subscriber writing to stderr.
///
/// `filter` uses `EnvFilter` directive syntax (e.g. `info,opbridge_core=debug`).
/// Stderr keeps stdout free for protocol frames.
///
/// # Errors
///
/// Returns an error if `filter` does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(filter: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
