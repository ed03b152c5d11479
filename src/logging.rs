//! Tracing setup for PensionBot
//!
//! Logs go to stderr so they never interleave with chat replies on stdout.
//! `RUST_LOG` wins over the verbosity flags when it is set.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Verbosity;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_colors: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_colors: true,
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Map CLI verbosity onto a log level
    pub fn from_verbosity(verbosity: Verbosity) -> Self {
        let level = match verbosity {
            Verbosity::Quiet => Level::ERROR,
            Verbosity::Normal => Level::WARN,
            Verbosity::Verbose => Level::INFO,
            Verbosity::VeryVerbose => Level::DEBUG,
        };
        Self {
            level,
            with_target: matches!(verbosity, Verbosity::VeryVerbose),
            ..Self::default()
        }
    }

    /// Disable ANSI colours
    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    /// Filter directive applied when RUST_LOG is absent
    pub fn directive(&self) -> String {
        format!("pensionbot={}", self.level.as_str().to_lowercase())
    }
}

/// Initialize the global subscriber
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.use_colors)
        .with_target(config.with_target);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(level = ?config.level, "Logging initialized");
    Ok(())
}
