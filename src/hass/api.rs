use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::entity::EntityState;

/// Attributes of a Home Assistant state object that matter here.
#[derive(Debug, Default, Deserialize)]
pub struct HassAttributes {
    pub friendly_name: Option<String>,
    pub unit_of_measurement: Option<String>,
}

/// Home Assistant state object (`GET /api/states/{entity_id}`).
#[derive(Debug, Deserialize)]
pub struct HassState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: HassAttributes,
}

impl From<HassState> for EntityState {
    fn from(s: HassState) -> Self {
        EntityState {
            entity_id: s.entity_id,
            friendly_name: s.attributes.friendly_name,
            state: s.state,
            unit_of_measurement: s.attributes.unit_of_measurement,
        }
    }
}

#[derive(Serialize)]
struct TemplateRequest<'a> {
    template: &'a str,
}

/// HTTP client for the Home Assistant REST API.
///
/// Authenticates with a long-lived access token.
pub struct HassClient {
    token: String,
    http_client: Client,
    base_url: String,
}

impl HassClient {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("sensor-blaster/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build Home Assistant HTTP client")?;
        Ok(Self {
            token,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Render a template server-side and return the raw text.
    pub async fn render_template(&self, template: &str) -> Result<String> {
        let url = format!("{}/api/template", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&TemplateRequest { template })
            .send()
            .await
            .context("Failed to send render_template request")?;

        check_response_status(&response)?;
        response
            .text()
            .await
            .context("Failed to read template response")
    }

    /// Render a template that ends in `| tojson` and decode the list result.
    pub async fn render_list(&self, template: &str) -> Result<Vec<String>> {
        let text = self.render_template(template).await?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(text)
            .with_context(|| format!("Template did not render a list of strings: {}", text))
    }

    /// Fetch the current state of one entity; `None` if unknown to the host.
    pub async fn fetch_state(&self, entity_id: &str) -> Result<Option<HassState>> {
        let url = format!(
            "{}/api/states/{}",
            self.base_url,
            urlencoding::encode(entity_id)
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to send fetch_state request")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_response_status(&response)?;
        response
            .json::<HassState>()
            .await
            .map(Some)
            .context("Failed to parse state response")
    }
}

/// Map error statuses to descriptive errors.
///
/// - 401 → auth error (token missing or revoked)
/// - 400 → template error
/// - Other non-2xx → generic API error
fn check_response_status(response: &reqwest::Response) -> Result<()> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(anyhow!(
            "Home Assistant auth error: access token invalid"
        )),
        StatusCode::BAD_REQUEST => Err(anyhow!("Home Assistant rejected template")),
        s if !s.is_success() => Err(anyhow!("Home Assistant API error: {}", s)),
        _ => Ok(()),
    }
}
