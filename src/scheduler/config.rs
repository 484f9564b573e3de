//! Refresh scheduler configuration
//!
//! Loaded from TOML; durations are humantime strings:
//!
//! ```toml
//! group = "amateur"
//! refresh-interval = "1h"
//! poll-interval = "60s"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::data::celestrak::{CELESTRAK_GP_URL, CELESTRAK_PROBE_URL};
use crate::{NearsatError, Result};

/// Element group fetched when none is configured
pub const DEFAULT_GROUP: &str = "amateur";

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RefreshConfig {
    /// CelesTrak group name
    pub group: String,
    /// Minimum time between completed refreshes
    #[serde(deserialize_with = "humantime_duration")]
    pub refresh_interval: Duration,
    /// How often the worker wakes to check whether a refresh is due
    #[serde(deserialize_with = "humantime_duration")]
    pub poll_interval: Duration,
    /// Timeout of the connectivity probe
    #[serde(deserialize_with = "humantime_duration")]
    pub probe_timeout: Duration,
    /// Timeout of the group fetch
    #[serde(deserialize_with = "humantime_duration")]
    pub fetch_timeout: Duration,
    /// GP query endpoint
    pub feed_url: String,
    /// URL probed for connectivity
    pub probe_url: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            group: DEFAULT_GROUP.to_string(),
            refresh_interval: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(20),
            feed_url: CELESTRAK_GP_URL.to_string(),
            probe_url: CELESTRAK_PROBE_URL.to_string(),
        }
    }
}

impl RefreshConfig {
    /// Defaults with the two settings a host normally chooses.
    pub fn new(group: impl Into<String>, refresh_interval: Duration) -> Self {
        RefreshConfig {
            group: group.into(),
            refresh_interval,
            ..Default::default()
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            NearsatError::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RefreshConfig = toml::from_str(s)
            .map_err(|e| NearsatError::Config(format!("Failed to parse config: {}", e)))?;

        if cfg.group.trim().is_empty() {
            return Err(NearsatError::Config("group must not be empty".into()));
        }
        if cfg.poll_interval.is_zero() {
            return Err(NearsatError::Config("poll-interval must be positive".into()));
        }

        Ok(cfg)
    }
}

fn humantime_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_defaults() {
        let cfg = RefreshConfig::default();
        assert_eq!(cfg.group, "amateur");
        assert_eq!(cfg.refresh_interval, Duration::from_secs(3600));
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(RefreshConfig::from_toml_str("").unwrap(), RefreshConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let cfg = RefreshConfig::from_toml_str(indoc! {r#"
            group = "stations"
            refresh-interval = "2h 30m"
            poll-interval = "15s"
            fetch-timeout = "45s"
        "#})
        .unwrap();

        assert_eq!(cfg.group, "stations");
        assert_eq!(cfg.refresh_interval, Duration::from_secs(9000));
        assert_eq!(cfg.poll_interval, Duration::from_secs(15));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(45));
        assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_duration_rejected() {
        let err = RefreshConfig::from_toml_str("poll-interval = \"soon\"").unwrap_err();
        assert!(matches!(err, NearsatError::Config(_)));
    }

    #[test]
    fn test_validation() {
        assert!(RefreshConfig::from_toml_str("group = \"  \"").is_err());
        assert!(RefreshConfig::from_toml_str("poll-interval = \"0s\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nearsat.toml");
        std::fs::write(&path, "group = \"weather\"\n").unwrap();
        assert_eq!(RefreshConfig::load(&path).unwrap().group, "weather");

        let missing = RefreshConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(NearsatError::Config(_))));
    }
}
