//! Tracing/logging initialization.
//!
//! `RUST_LOG` selects what is logged (default `info`); `WARDEN_LOG_FORMAT`
//! selects how (`json`, the default, or `pretty`).

use std::str::FromStr;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_ENV: &str = "WARDEN_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, multi-line output for local development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => bail!("unknown log format {other:?} (expected \"json\" or \"pretty\")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            format: LogFormat::Json,
            with_target: false,
        }
    }
}

impl TracingConfig {
    /// Defaults, with the format taken from `WARDEN_LOG_FORMAT` when set.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(LOG_FORMAT_ENV) {
            config.format = raw
                .parse()
                .with_context(|| format!("invalid {LOG_FORMAT_ENV}"))?;
        }
        Ok(config)
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Initialize tracing/logging for the process from the environment.
///
/// An invalid `WARDEN_LOG_FORMAT` falls back to the defaults and is reported
/// once the subscriber is up. Safe to call multiple times.
pub fn init() {
    match TracingConfig::from_env() {
        Ok(config) => init_with(&config),
        Err(err) => {
            init_with(&TracingConfig::default());
            let error = format!("{err:#}");
            ::tracing::warn!(%error, "falling back to default tracing config");
        }
    }
}

/// Initialize tracing/logging with an explicit configuration.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(config: &TracingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.with_target);

    let _ = match config.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

/// Route tracing output through the test harness so it is only shown for
/// failing tests. Safe to call from every test.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_known_names() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn repeated_initialization_is_a_noop() {
        init_for_tests();
        init_for_tests();
        init_with(&TracingConfig::default());
    }
}
