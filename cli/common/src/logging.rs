//! Logging initialization utilities.

use anyhow::{Result, anyhow};
use std::fmt;
use tracing::Level;
use tracing_subscriber::fmt as subscriber_fmt;

use crate::LogLevel;

/// Where the effective log level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    CommandLine,
    ConfigFile,
    Default,
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CommandLine => "command line",
            Self::ConfigFile => "config file",
            Self::Default => "default",
        })
    }
}

/// Pick the log level: command line, then config file, then `info`.
pub fn resolve_log_level(
    cli: Option<LogLevel>,
    config: Option<&str>,
) -> Result<(LogLevel, LevelSource)> {
    if let Some(level) = cli {
        return Ok((level, LevelSource::CommandLine));
    }
    if let Some(value) = config {
        let level = value
            .parse::<LogLevel>()
            .map_err(|e| anyhow!("runtime.log_level: {e}"))?;
        return Ok((level, LevelSource::ConfigFile));
    }
    Ok((LogLevel::Info, LevelSource::Default))
}

/// Initialize logging with the specified level.
///
/// Logs are written to stderr so stdout remains clean for program output.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    subscriber_fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}
