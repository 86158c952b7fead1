use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_PROGRESS_INTERVAL};

/// Runtime settings for a chain and its sealer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Leading zero hex digits required of every sealed hash.
    pub difficulty: u32,
    /// Sealer worker threads (defaults to the number of CPUs).
    pub workers: usize,
    /// Attempts between per-worker progress traces.
    pub progress_interval: u64,
    /// Upper bound on a single seal; `None` searches until a nonce is found.
    pub seal_timeout: Option<Duration>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            workers: num_cpus::get().max(1),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            seal_timeout: None,
        }
    }
}

impl ChainConfig {
    /// Build a config from `LEDGER_*` environment variables. Missing or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            difficulty: parse_var("LEDGER_DIFFICULTY").unwrap_or(defaults.difficulty),
            workers: parse_var("LEDGER_WORKERS")
                .filter(|w: &usize| *w > 0)
                .unwrap_or(defaults.workers),
            progress_interval: parse_var("LEDGER_PROGRESS_INTERVAL")
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.progress_interval),
            seal_timeout: parse_var("LEDGER_SEAL_TIMEOUT_MS").map(Duration::from_millis),
        }
    }

    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_seal_timeout(mut self, timeout: Duration) -> Self {
        self.seal_timeout = Some(timeout);
        self
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_at_least_one_worker() {
        let config = ChainConfig::default();
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert!(config.workers >= 1);
        assert_eq!(config.seal_timeout, None);
    }

    #[test]
    fn builders_override_fields() {
        let config = ChainConfig::default()
            .with_difficulty(1)
            .with_workers(0)
            .with_seal_timeout(Duration::from_millis(250));
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.workers, 1);
        assert_eq!(config.seal_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn unset_variable_parses_to_none() {
        assert_eq!(parse_var::<u32>("LEDGER_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
