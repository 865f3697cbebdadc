//! Persisted configuration for the exporter.
//!
//! Everything here is plain serde data so the binary, the engine and any future
//! settings UI agree on one file format. Path defaults that depend on the platform
//! are left as `None` and resolved by the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lower bound on the interval between two polls of the remote API.
pub const MIN_POLL_INTERVAL_SECS: u64 = 300;

/// Where the unicode symbol (☠, ⚔) goes relative to a published number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnicodeSigning {
    None,
    Prefixed,
    #[default]
    Suffixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetWeekday {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Weekly reset boundary, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyReset {
    pub weekday: ResetWeekday,
    pub hour: u32,
    pub minute: u32,
}

impl Default for WeeklyReset {
    fn default() -> Self {
        Self {
            weekday: ResetWeekday::Monday,
            hour: 7,
            minute: 30,
        }
    }
}

/// Retry policy for remote API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay_ms: u64,
    /// Upper bound on a single attempt
    pub timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 30_000,
            timeout_ms: 30_000,
        }
    }
}

/// Retry policy for output writes and deletes (files held open by a capture tool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkRetrySettings {
    /// Retries after the first failed attempt
    pub retries: u32,
    pub delay_ms: u64,
}

impl Default for SinkRetrySettings {
    fn default() -> Self {
        Self {
            retries: 2,
            delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOutConfig {
    /// Folder the overlay reads from. `None` means `<data dir>/stream-out/stream_out`.
    pub output_dir: Option<PathBuf>,
    /// Persisted reset windows and baselines. `None` means `<config dir>/stream-out/state.json`.
    pub state_file: Option<PathBuf>,
    /// Commander/catmander tag and combat icons.
    pub assets_dir: Option<PathBuf>,
    /// Rolling log files are written here when set, stderr otherwise.
    pub log_dir: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub unicode_signing: UnicodeSigning,
    pub use_catmander_tag: bool,
    pub retry: RetrySettings,
    pub sink_retry: SinkRetrySettings,
    pub weekly_reset: WeeklyReset,
}

impl Default for StreamOutConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            state_file: None,
            assets_dir: None,
            log_dir: None,
            poll_interval_secs: MIN_POLL_INTERVAL_SECS,
            unicode_signing: UnicodeSigning::default(),
            use_catmander_tag: false,
            retry: RetrySettings::default(),
            sink_retry: SinkRetrySettings::default(),
            weekly_reset: WeeklyReset::default(),
        }
    }
}

impl StreamOutConfig {
    /// Poll interval with the API-load floor applied.
    pub fn effective_poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
poll_interval_secs = 600
unicode_signing = "prefixed"
use_catmander_tag = true

[retry]
attempts = 5

[weekly_reset]
weekday = "friday"
hour = 18
"#;

        let config: StreamOutConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_secs, 600);
        assert_eq!(config.unicode_signing, UnicodeSigning::Prefixed);
        assert!(config.use_catmander_tag);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay_ms, 30_000);
        assert_eq!(config.weekly_reset.weekday, ResetWeekday::Friday);
        assert_eq!(config.weekly_reset.hour, 18);
        assert_eq!(config.weekly_reset.minute, 30);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: StreamOutConfig = toml::from_str("").unwrap();
        assert_eq!(config, StreamOutConfig::default());
        assert_eq!(config.unicode_signing, UnicodeSigning::Suffixed);
        assert_eq!(config.sink_retry.retries, 2);
    }

    #[test]
    fn test_poll_interval_is_floored() {
        let config = StreamOutConfig {
            poll_interval_secs: 30,
            ..Default::default()
        };
        assert_eq!(config.effective_poll_interval_secs(), MIN_POLL_INTERVAL_SECS);

        let config = StreamOutConfig {
            poll_interval_secs: 900,
            ..Default::default()
        };
        assert_eq!(config.effective_poll_interval_secs(), 900);
    }
}
