//! Application configuration.
//!
//! Everything has a default, so a missing config file is not an error. The
//! simulation timings live here so tests can shrink them to zero.

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Inclusive bounds for a randomized wait, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        DelayRange { min_ms, max_ms }
    }

    pub const fn zero() -> Self {
        DelayRange::new(0, 0)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms.max(self.min_ms))
    }
}

/// Simulated processing latency applied before each public operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationLatency {
    pub get_profile: DelayRange,
    pub update_profile: DelayRange,
    pub list_contacts: DelayRange,
    pub add_contact: DelayRange,
    pub remove_contact: DelayRange,
    pub block_contact: DelayRange,
    pub chat_summaries: DelayRange,
    pub send_message: DelayRange,
    pub get_messages: DelayRange,
    pub mark_as_read: DelayRange,
    pub clear_history: DelayRange,
    pub get_settings: DelayRange,
    pub update_settings: DelayRange,
}

impl Default for OperationLatency {
    fn default() -> Self {
        OperationLatency {
            get_profile: DelayRange::new(20, 50),
            update_profile: DelayRange::new(30, 80),
            list_contacts: DelayRange::new(20, 60),
            add_contact: DelayRange::new(50, 150),
            remove_contact: DelayRange::new(30, 80),
            block_contact: DelayRange::new(30, 80),
            chat_summaries: DelayRange::new(30, 80),
            send_message: DelayRange::new(20, 60),
            get_messages: DelayRange::new(20, 60),
            mark_as_read: DelayRange::new(10, 30),
            clear_history: DelayRange::new(30, 80),
            get_settings: DelayRange::new(10, 30),
            update_settings: DelayRange::new(20, 50),
        }
    }
}

impl OperationLatency {
    pub fn instant() -> Self {
        let z = DelayRange::zero();
        OperationLatency {
            get_profile: z,
            update_profile: z,
            list_contacts: z,
            add_contact: z,
            remove_contact: z,
            block_contact: z,
            chat_summaries: z,
            send_message: z,
            get_messages: z,
            mark_as_read: z,
            clear_history: z,
            get_settings: z,
            update_settings: z,
        }
    }
}

/// Timings for the in-memory backend and its background simulations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub latency: OperationLatency,
    /// sending -> sent
    pub sent_delay: DelayRange,
    /// sent -> delivered
    pub delivered_delay: DelayRange,
    /// delivered -> auto-reply
    pub reply_delay: DelayRange,
    /// Pause between presence toggles.
    pub presence_interval: DelayRange,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            latency: OperationLatency::default(),
            sent_delay: DelayRange::new(150, 300),
            delivered_delay: DelayRange::new(400, 700),
            reply_delay: DelayRange::new(1_000, 3_000),
            presence_interval: DelayRange::new(10_000, 30_000),
        }
    }
}

impl SimulationConfig {
    /// Every wait collapses to zero. Ordering between stages is kept.
    pub fn instant() -> Self {
        SimulationConfig {
            latency: OperationLatency::instant(),
            sent_delay: DelayRange::zero(),
            delivered_delay: DelayRange::zero(),
            reply_delay: DelayRange::zero(),
            presence_interval: DelayRange::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: "info".to_string(),
            log_file: None,
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the per-user config file when `path` is
    /// `None`. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(AppConfig::default()),
            },
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("invalid log level '{}'", self.log_level))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quillet").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_timings() {
        let sim = SimulationConfig::default();
        assert_eq!(sim.sent_delay, DelayRange::new(150, 300));
        assert_eq!(sim.delivered_delay, DelayRange::new(400, 700));
        assert_eq!(sim.reply_delay, DelayRange::new(1_000, 3_000));
        assert_eq!(sim.presence_interval, DelayRange::new(10_000, 30_000));
        assert_eq!(sim.latency.mark_as_read, DelayRange::new(10, 30));
    }

    #[test]
    fn test_delay_range_max_never_below_min() {
        let r = DelayRange::new(50, 10);
        assert_eq!(r.min(), Duration::from_millis(50));
        assert_eq!(r.max(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "log_level": "debug", "simulation": {{ "reply_delay": {{ "min_ms": 5, "max_ms": 10 }} }} }}"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
        assert_eq!(config.simulation.reply_delay, DelayRange::new(5, 10));
        assert_eq!(config.simulation.sent_delay, DelayRange::new(150, 300));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("nope.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_log_level() {
        let config = AppConfig {
            log_level: "chatty".to_string(),
            ..AppConfig::default()
        };
        assert!(config.level_filter().is_err());
    }
}
