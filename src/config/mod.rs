pub mod overrides;
mod validation;

pub use validation::{validate, ConfigError};

use serde::Deserialize;
use std::path::Path;

use crate::payload::MAX_PAYLOAD_BYTES;
use crate::shipper::DEFAULT_TIMEOUT_SECS;

/// Label used when no sensor groups are configured.
pub const DEFAULT_SENSOR_GROUP: &str = "TRMNL";

/// Complete blaster configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlasterConfig {
    /// Group labels to report, in payload order
    #[serde(default = "default_sensor_groups")]
    pub sensor_groups: Vec<String>,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub payload: PayloadConfig,
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
}

pub fn default_sensor_groups() -> Vec<String> {
    vec![DEFAULT_SENSOR_GROUP.to_string()]
}

impl Default for BlasterConfig {
    fn default() -> Self {
        Self {
            sensor_groups: default_sensor_groups(),
            webhook: WebhookConfig::default(),
            schedule: ScheduleConfig::default(),
            payload: PayloadConfig::default(),
            home_assistant: HomeAssistantConfig::default(),
        }
    }
}

impl BlasterConfig {
    /// Human-readable name for this configuration
    pub fn title(&self) -> String {
        format!("TRMNL Blaster ({} groups)", self.sensor_groups.len())
    }
}

/// Remote webhook endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
    /// Bound on a single POST (seconds)
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
}

fn default_webhook_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: default_webhook_timeout(),
        }
    }
}

/// Reporting cadence
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between scheduled passes
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

fn default_interval() -> u64 {
    1800
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

/// Outbound payload limits
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayloadConfig {
    /// Ceiling for the compact JSON encoding (bytes)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    MAX_PAYLOAD_BYTES
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

/// Home Assistant REST API access
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default = "default_hass_url")]
    pub url: String,
    /// Long-lived access token
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_hass_timeout")]
    pub timeout_seconds: u64,
}

fn default_hass_url() -> String {
    "http://localhost:8123".to_string()
}

fn default_hass_timeout() -> u64 {
    10
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: default_hass_url(),
            token: String::new(),
            timeout_seconds: default_hass_timeout(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<BlasterConfig> {
    use anyhow::Context;

    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: BlasterConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
