//! Configuration of the [`crate::Eventstore`] facade.

use anyhow::Context;

/// Environment variable overriding [`EventstoreConfig::max_push_batch`].
pub const MAX_PUSH_BATCH_ENV: &str = "WARDEN_MAX_PUSH_BATCH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventstoreConfig {
    /// Largest number of commands accepted by a single push.
    pub max_push_batch: usize,
}

impl Default for EventstoreConfig {
    fn default() -> Self {
        Self { max_push_batch: 100 }
    }
}

impl EventstoreConfig {
    /// Defaults, overridden by `WARDEN_MAX_PUSH_BATCH` when set.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_PUSH_BATCH_ENV) {
            let max_push_batch: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_PUSH_BATCH_ENV} must be a positive integer, got {raw:?}"))?;
            anyhow::ensure!(max_push_batch > 0, "{MAX_PUSH_BATCH_ENV} must be greater than zero");
            config.max_push_batch = max_push_batch;
        }

        Ok(config)
    }
}
