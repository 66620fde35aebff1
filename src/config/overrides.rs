//! Environment overrides, applied on top of the file configuration.
//!
//! - `BLASTER_WEBHOOK_URL`
//! - `BLASTER_SENSOR_GROUPS` (comma-separated)
//! - `BLASTER_INTERVAL_SECONDS`
//! - `HASS_URL`
//! - `HASS_TOKEN`

use super::BlasterConfig;
use tracing::warn;

impl BlasterConfig {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are
    /// ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("BLASTER_WEBHOOK_URL") {
            self.webhook.url = v.trim().to_string();
        }
        if let Some(v) = lookup("BLASTER_SENSOR_GROUPS") {
            self.sensor_groups = parse_groups(&v);
        }
        if let Some(v) = lookup("BLASTER_INTERVAL_SECONDS") {
            match v.trim().parse::<u64>() {
                Ok(n) => self.schedule.interval_seconds = n,
                Err(_) => warn!(value = %v, "Ignoring invalid BLASTER_INTERVAL_SECONDS"),
            }
        }
        if let Some(v) = lookup("HASS_URL") {
            self.home_assistant.url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("HASS_TOKEN") {
            self.home_assistant.token = v.trim().to_string();
        }
        self
    }
}

/// Split a comma-separated label list, dropping blanks.
pub fn parse_groups(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
