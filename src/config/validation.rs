use super::BlasterConfig;
use std::fmt;

/// Reasons a configuration cannot be activated
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidUrl(String),
    NoSensorGroups,
    Unknown(String),
}

impl ConfigError {
    /// Stable error key, as shown by a configuration form
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidUrl(_) => "invalid_url",
            ConfigError::NoSensorGroups => "no_sensor_groups",
            ConfigError::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl(url) => {
                write!(f, "URL must start with http:// or https://, got '{}'", url)
            }
            ConfigError::NoSensorGroups => {
                write!(f, "at least one sensor group must be specified")
            }
            ConfigError::Unknown(e) => write!(f, "unexpected configuration error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<anyhow::Error> for ConfigError {
    fn from(e: anyhow::Error) -> Self {
        ConfigError::Unknown(format!("{:#}", e))
    }
}

/// Validates a configuration before activation.
///
/// Rules:
/// - Webhook URL must start with `http://` or `https://`
/// - At least one non-blank sensor group
/// - Interval, timeouts and payload ceiling must be non-zero
/// - Home Assistant URL must start with `http://` or `https://`
pub fn validate(config: &BlasterConfig) -> Result<(), ConfigError> {
    if !is_http_url(&config.webhook.url) {
        return Err(ConfigError::InvalidUrl(config.webhook.url.clone()));
    }

    if config.sensor_groups.iter().all(|g| g.trim().is_empty()) {
        return Err(ConfigError::NoSensorGroups);
    }

    if config.schedule.interval_seconds == 0 {
        return Err(ConfigError::Unknown("schedule.interval_seconds must be positive".to_string()));
    }
    if config.webhook.timeout_seconds == 0 || config.home_assistant.timeout_seconds == 0 {
        return Err(ConfigError::Unknown("timeout_seconds must be positive".to_string()));
    }
    if config.payload.max_bytes == 0 {
        return Err(ConfigError::Unknown("payload.max_bytes must be positive".to_string()));
    }

    if !is_http_url(&config.home_assistant.url) {
        return Err(ConfigError::InvalidUrl(config.home_assistant.url.clone()));
    }

    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn valid() -> BlasterConfig {
        let mut config = BlasterConfig::default();
        config.webhook.url = "https://usetrmnl.com/api/custom_plugins/abcd".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate(&valid()), Ok(()));

        let mut config = valid();
        config.webhook.url = "http://192.168.1.20/hook".to_string();
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_invalid_url() {
        for url in ["", "usetrmnl.com/hook", "ftp://example.com", "HTTP://x", " https://x"] {
            let mut config = valid();
            config.webhook.url = url.to_string();
            let err = validate(&config).unwrap_err();
            assert_eq!(err, ConfigError::InvalidUrl(url.to_string()));
            assert_eq!(err.code(), "invalid_url");
        }
    }

    #[test]
    fn test_no_sensor_groups() {
        let mut config = valid();
        config.sensor_groups = vec![];
        let err = validate(&config).unwrap_err();
        assert_eq!(err, ConfigError::NoSensorGroups);
        assert_eq!(err.code(), "no_sensor_groups");

        config.sensor_groups = vec!["  ".to_string()];
        assert_eq!(validate(&config), Err(ConfigError::NoSensorGroups));
    }

    #[test]
    fn test_url_checked_before_groups() {
        let mut config = valid();
        config.webhook.url = "nope".to_string();
        config.sensor_groups = vec![];
        assert_eq!(validate(&config).unwrap_err().code(), "invalid_url");
    }

    #[test]
    fn test_other_failures_are_unknown() {
        let mut config = valid();
        config.schedule.interval_seconds = 0;
        assert_eq!(validate(&config).unwrap_err().code(), "unknown");

        let err: ConfigError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.code(), "unknown");
        assert!(err.to_string().contains("disk on fire"));
    }
}
