pub mod api;

use crate::config::{default_sensor_groups, HomeAssistantConfig};
use crate::entity::EntityState;
use crate::resolver::{LabelResolver, StateStore};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use self::api::HassClient;

/// Home Assistant backend: resolves labels through the template API and
/// reads entity states through the states API.
pub struct HomeAssistant {
    client: HassClient,
}

impl HomeAssistant {
    pub fn new(config: &HomeAssistantConfig) -> Result<Self> {
        let client = HassClient::new(
            config.url.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(Self { client })
    }

    /// All label ids known to the host, sorted.
    ///
    /// Falls back to the default group list when the host has no labels or
    /// cannot be queried.
    pub async fn available_labels(&self) -> Vec<String> {
        match self.client.render_list("{{ labels() | tojson }}").await {
            Ok(mut labels) if !labels.is_empty() => {
                labels.sort();
                labels
            }
            Ok(_) => default_sensor_groups(),
            Err(e) => {
                warn!(error = %e, "Failed to list Home Assistant labels");
                default_sensor_groups()
            }
        }
    }
}

/// Template listing every entity tagged with `label`, rendered as JSON.
pub fn label_template(label: &str) -> String {
    let escaped = label.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{{{{ label_entities('{}') | tojson }}}}", escaped)
}

#[async_trait]
impl LabelResolver for HomeAssistant {
    async fn label_entities(&self, label: &str) -> Result<Vec<String>> {
        let ids = self.client.render_list(&label_template(label)).await?;
        debug!(group = %label, count = ids.len(), "Rendered label template");
        Ok(ids)
    }
}

#[async_trait]
impl StateStore for HomeAssistant {
    async fn get(&self, entity_id: &str) -> Result<Option<EntityState>> {
        Ok(self.client.fetch_state(entity_id).await?.map(EntityState::from))
    }
}
