//! # Configuration
//!
//! Commit tuning loaded from environment variables. Missing or unparseable
//! values fall back to the defaults in [`crate::constants`].

use crate::constants::{
    DEFAULT_COMMIT_BACKOFF_MAX_MS, DEFAULT_COMMIT_BACKOFF_MIN_MS, DEFAULT_COMMIT_MAX_ATTEMPTS,
    DEFAULT_FIELD_MANAGER,
};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_COMMIT_MAX_ATTEMPTS: &str = "TCP_COMMIT_MAX_ATTEMPTS";
pub const ENV_COMMIT_BACKOFF_MIN_MS: &str = "TCP_COMMIT_BACKOFF_MIN_MS";
pub const ENV_COMMIT_BACKOFF_MAX_MS: &str = "TCP_COMMIT_BACKOFF_MAX_MS";
pub const ENV_FIELD_MANAGER: &str = "TCP_FIELD_MANAGER";

/// How whole-object commits are retried on write conflicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitConfig {
    /// Attempts before giving up with `RetriesExhausted` (at least 1)
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// Field manager recorded on status patches
    pub field_manager: String,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_COMMIT_MAX_ATTEMPTS,
            backoff_min: Duration::from_millis(DEFAULT_COMMIT_BACKOFF_MIN_MS),
            backoff_max: Duration::from_millis(DEFAULT_COMMIT_BACKOFF_MAX_MS),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl CommitConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` uses the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_attempts = parse_or(&lookup, ENV_COMMIT_MAX_ATTEMPTS, DEFAULT_COMMIT_MAX_ATTEMPTS).max(1);
        let min_ms = parse_or(&lookup, ENV_COMMIT_BACKOFF_MIN_MS, DEFAULT_COMMIT_BACKOFF_MIN_MS);
        let max_ms = parse_or(&lookup, ENV_COMMIT_BACKOFF_MAX_MS, DEFAULT_COMMIT_BACKOFF_MAX_MS).max(min_ms);
        let field_manager = lookup(ENV_FIELD_MANAGER)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_FIELD_MANAGER.to_string());

        Self {
            max_attempts,
            backoff_min: Duration::from_millis(min_ms),
            backoff_max: Duration::from_millis(max_ms),
            field_manager,
        }
    }

    /// No waiting between attempts; for tests and offline tooling
    pub fn without_backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_min: Duration::ZERO,
            backoff_max: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}
