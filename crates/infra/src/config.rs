//! Scanner configuration: defaults plus `SHELFSCAN_*` environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use shelfscan_core::Facing;
use shelfscan_observability::LogSettings;
use shelfscan_scanner::ScanLoopConfig;

pub const ENV_POLL_INTERVAL_MS: &str = "SHELFSCAN_POLL_INTERVAL_MS";
pub const ENV_SWITCH_SETTLE_MS: &str = "SHELFSCAN_SWITCH_SETTLE_MS";
pub const ENV_FACING: &str = "SHELFSCAN_FACING";
pub const ENV_CATALOG_PATH: &str = "SHELFSCAN_CATALOG_PATH";
pub const ENV_ACTIVITY_LOG_CAPACITY: &str = "SHELFSCAN_ACTIVITY_LOG_CAPACITY";
pub const ENV_LOG: &str = "SHELFSCAN_LOG";
pub const ENV_LOG_JSON: &str = "SHELFSCAN_LOG_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    pub poll_interval: Duration,
    pub switch_settle: Duration,
    /// Camera the session starts on
    pub facing: Facing,
    pub catalog_path: PathBuf,
    /// Lines kept by the activity log
    pub activity_log_capacity: usize,
    pub log: LogSettings,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let scan = ScanLoopConfig::default();
        Self {
            poll_interval: scan.poll_interval,
            switch_settle: scan.switch_settle,
            facing: scan.facing,
            catalog_path: PathBuf::from("all_books.json"),
            activity_log_capacity: 10,
            log: LogSettings::default(),
        }
    }
}

impl ScannerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `SHELFSCAN_*` key. Unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_SWITCH_SETTLE_MS) {
            config.switch_settle = parse_millis(ENV_SWITCH_SETTLE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_FACING) {
            config.facing = value
                .parse::<Facing>()
                .with_context(|| format!("invalid {ENV_FACING}"))?;
        }
        if let Some(value) = lookup(ENV_CATALOG_PATH) {
            config.catalog_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_ACTIVITY_LOG_CAPACITY) {
            config.activity_log_capacity = value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid {ENV_ACTIVITY_LOG_CAPACITY}: {value:?}"))?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.log.default_filter = value;
        }
        if let Some(value) = lookup(ENV_LOG_JSON) {
            config.log.json = parse_flag(ENV_LOG_JSON, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            bail!("poll interval must be greater than zero");
        }
        if self.activity_log_capacity == 0 {
            bail!("activity log capacity must be greater than zero");
        }
        Ok(())
    }

    pub fn scan_loop(&self) -> ScanLoopConfig {
        ScanLoopConfig::default()
            .with_poll_interval(self.poll_interval)
            .with_switch_settle(self.switch_settle)
            .with_facing(self.facing)
    }
}

fn parse_millis(key: &str, value: &str) -> anyhow::Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key}: {value:?} (expected milliseconds)"))?;
    Ok(Duration::from_millis(ms))
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid {key}: {other:?} (expected true/false)"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_scan_loop() {
        let config = ScannerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ScannerConfig::default());
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.switch_settle, Duration::from_millis(300));
        assert_eq!(config.facing, Facing::Environment);
        assert_eq!(config.catalog_path, PathBuf::from("all_books.json"));
        assert_eq!(config.activity_log_capacity, 10);
        assert_eq!(config.scan_loop(), ScanLoopConfig::default());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = ScannerConfig::from_lookup(lookup(&[
            (ENV_POLL_INTERVAL_MS, "250"),
            (ENV_SWITCH_SETTLE_MS, " 0 "),
            (ENV_FACING, "front"),
            (ENV_CATALOG_PATH, "/srv/books.json"),
            (ENV_ACTIVITY_LOG_CAPACITY, "25"),
            (ENV_LOG, "shelfscan_scanner=debug"),
            (ENV_LOG_JSON, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.switch_settle, Duration::ZERO);
        assert_eq!(config.facing, Facing::User);
        assert_eq!(config.catalog_path, PathBuf::from("/srv/books.json"));
        assert_eq!(config.activity_log_capacity, 25);
        assert_eq!(config.log.default_filter, "shelfscan_scanner=debug");
        assert!(config.log.json);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = ScannerConfig::from_lookup(lookup(&[(ENV_POLL_INTERVAL_MS, "fast")])).unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));

        let err = ScannerConfig::from_lookup(lookup(&[(ENV_FACING, "sideways")])).unwrap_err();
        assert!(err.to_string().contains(ENV_FACING));

        let err = ScannerConfig::from_lookup(lookup(&[(ENV_LOG_JSON, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(ENV_LOG_JSON));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = ScannerConfig::from_lookup(lookup(&[(ENV_POLL_INTERVAL_MS, "0")])).unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }
}
