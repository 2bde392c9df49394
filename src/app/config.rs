use log::LevelFilter;
use serde::Deserialize;
use std::{fmt, fs, io, str::FromStr, time::Duration};

use crate::{
    poll::PollConfig,
    sink::{ChartOptions, GaugeOptions},
};

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Yaml(serde_yml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "error opening config file: {}", err),
            ConfigError::Yaml(err) => write!(f, "error parsing config file: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Yaml(err) => Some(err),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub tick_rate_ms: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub gauge: GaugeOptions,
    #[serde(default)]
    pub chart: ChartOptions,
}

impl AppConfig {
    pub const PATH: &str = "./config_example.yaml";
    const URL: &str = "http://127.0.0.1:5000/status";
    const INTERVAL: Duration = Duration::from_millis(5000);
    const TIMEOUT: Duration = Duration::from_millis(4000);
    const TICK_RATE: Duration = Duration::from_millis(100);

    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(config_path).map_err(ConfigError::Io)?;
        Self::parse(&config_str)
    }

    /// Loads `config_path`, or the defaults plus the reason they were used.
    pub fn load_or_default(config_path: &str) -> (Self, Option<ConfigError>) {
        match Self::load(config_path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    pub fn parse(config_str: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(config_str).map_err(ConfigError::Yaml)
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(Self::URL)
    }

    pub fn interval(&self) -> Duration {
        self.interval_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::INTERVAL)
            .max(Duration::from_millis(1))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::TIMEOUT)
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::TICK_RATE)
    }

    /// Configured level, or `fallback` when unset or unparsable.
    pub fn log_level(&self, fallback: LevelFilter) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| LevelFilter::from_str(level).ok())
            .unwrap_or(fallback)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            url: self.url().to_string(),
            interval: self.interval(),
            timeout: self.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config.url(), "http://127.0.0.1:5000/status");
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert_eq!(config.tick_rate(), Duration::from_millis(100));
        assert_eq!(config.gauge.max_value, 120.0);
        assert_eq!(config.chart.min_value, Some(20.0));
        assert_eq!(config.log_level(LevelFilter::Off), LevelFilter::Off);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
url: http://pi.local/status
interval_ms: 1000
log_level: debug
gauge:
  max_value: 90
  pointer:
    color: '#ffffff'
chart:
  max_value: ~
";
        let config = AppConfig::parse(yaml).unwrap();
        assert_eq!(config.url(), "http://pi.local/status");
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.log_level(LevelFilter::Off), LevelFilter::Debug);
        assert_eq!(config.gauge.max_value, 90.0);
        assert_eq!(config.gauge.min_value, 15.0);
        assert_eq!(config.gauge.pointer.color, "#ffffff");
        assert_eq!(config.gauge.pointer.length, 0.6);
        assert_eq!(config.chart.max_value, None);
        assert_eq!(config.chart.vertical_sections, 9);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let (config, err) = AppConfig::load_or_default("./no/such/config.yaml");
        assert!(matches!(err, Some(ConfigError::Io(_))));
        assert_eq!(config.url(), "http://127.0.0.1:5000/status");
        assert_eq!(config.gauge.max_value, 120.0);
    }

    #[test]
    fn zero_interval_is_raised() {
        let config = AppConfig::parse("interval_ms: 0").unwrap();
        assert_eq!(config.interval(), Duration::from_millis(1));
    }

    #[test]
    fn poll_config_carries_endpoint_settings() {
        let config = AppConfig::parse("timeout_ms: 250").unwrap();
        let poll = config.poll_config();
        assert_eq!(poll.url, "http://127.0.0.1:5000/status");
        assert_eq!(poll.timeout, Duration::from_millis(250));
    }

    #[test]
    fn bad_yaml_and_missing_file_are_errors() {
        assert!(matches!(AppConfig::parse("gauge: [1, 2"), Err(ConfigError::Yaml(_))));
        assert!(matches!(
            AppConfig::load("./no/such/config.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
