// End-to-end passes against a mock Home Assistant API and a mock webhook.
//
// Both servers are mockito instances; the blaster is wired exactly as the
// binary does it (one HomeAssistant backend serving labels and states).

use mockito::{Matcher, Mock, Server, ServerGuard};
use sensor_blaster::config::HomeAssistantConfig;
use sensor_blaster::hass::HomeAssistant;
use sensor_blaster::{Blaster, BlasterConfig, DeliveryOutcome, PassOutcome};
use std::sync::Arc;

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn mock_label(server: &mut ServerGuard, label: &str, body: &str) -> Mock {
    server
        .mock("POST", "/api/template")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "template": format!("{{{{ label_entities('{}') | tojson }}}}", label)
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_state(server: &mut ServerGuard, entity_id: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", format!("/api/states/{}", entity_id).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn blaster(hass_url: String, webhook_url: String, groups: &[&str]) -> Blaster {
    let mut config = BlasterConfig::default();
    config.webhook.url = webhook_url;
    config.webhook.timeout_seconds = 5;
    config.sensor_groups = groups.iter().map(|g| g.to_string()).collect();
    config.home_assistant = HomeAssistantConfig {
        url: hass_url,
        token: "token".to_string(),
        timeout_seconds: 5,
    };

    let hass = Arc::new(HomeAssistant::new(&config.home_assistant).unwrap());
    Blaster::new(config, hass.clone(), hass).unwrap()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_kitchen_temperature_is_delivered() {
    let mut hass = Server::new_async().await;
    let mut webhook = Server::new_async().await;

    let _labels = mock_label(&mut hass, "kitchen", r#"["sensor.temp","sensor.temp"]"#).await;
    let _state = mock_state(
        &mut hass,
        "sensor.temp",
        serde_json::json!({
            "entity_id": "sensor.temp",
            "state": "21.0",
            "attributes": {"friendly_name": "Temp", "unit_of_measurement": "°C"}
        }),
    )
    .await;
    let hook = webhook
        .mock("POST", "/hook")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "merge_variables": {
                "kitchen": [{"name": "Temp", "value": "21°C"}],
                "total_count": 1,
                "groups": ["kitchen"]
            }
        })))
        .with_status(200)
        .with_body("{\"ok\":true}")
        .expect(1)
        .create_async()
        .await;

    let outcome = blaster(hass.url(), format!("{}/hook", webhook.url()), &["kitchen"])
        .run_once()
        .await;

    assert!(outcome.is_success(), "unexpected outcome {:?}", outcome);
    hook.assert_async().await;
}

#[tokio::test]
async fn test_unavailable_entity_is_excluded() {
    let mut hass = Server::new_async().await;
    let mut webhook = Server::new_async().await;

    let _labels = mock_label(&mut hass, "garden", r#"["sensor.soil","sensor.rain"]"#).await;
    let _soil = mock_state(
        &mut hass,
        "sensor.soil",
        serde_json::json!({"entity_id": "sensor.soil", "state": "unavailable", "attributes": {}}),
    )
    .await;
    let _rain = mock_state(
        &mut hass,
        "sensor.rain",
        serde_json::json!({
            "entity_id": "sensor.rain",
            "state": "2.35",
            "attributes": {"unit_of_measurement": "mm"}
        }),
    )
    .await;
    let hook = webhook
        .mock("POST", "/hook")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "merge_variables": {
                "garden": [{"name": "rain", "value": "2.4mm"}],
                "total_count": 1
            }
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let outcome = blaster(hass.url(), format!("{}/hook", webhook.url()), &["garden"])
        .run_once()
        .await;

    assert!(outcome.is_success(), "unexpected outcome {:?}", outcome);
    hook.assert_async().await;
}

#[tokio::test]
async fn test_no_entities_means_no_request() {
    let mut hass = Server::new_async().await;
    let mut webhook = Server::new_async().await;

    let _empty = mock_label(&mut hass, "empty", "[]").await;
    let _broken = hass
        .mock("POST", "/api/template")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "template": "{{ label_entities('broken') | tojson }}"
        })))
        .with_status(400)
        .create_async()
        .await;
    let hook = webhook
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let outcome = blaster(hass.url(), format!("{}/hook", webhook.url()), &["empty", "broken"])
        .run_once()
        .await;

    assert_eq!(outcome, PassOutcome::NoData);
    hook.assert_async().await;
}

#[tokio::test]
async fn test_webhook_503_is_reported_once() {
    let mut hass = Server::new_async().await;
    let mut webhook = Server::new_async().await;

    let _labels = mock_label(&mut hass, "TRMNL", r#"["sensor.temp"]"#).await;
    let _state = mock_state(
        &mut hass,
        "sensor.temp",
        serde_json::json!({"entity_id": "sensor.temp", "state": "19"}),
    )
    .await;
    let hook = webhook
        .mock("POST", "/hook")
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(1)
        .create_async()
        .await;

    let outcome = blaster(hass.url(), format!("{}/hook", webhook.url()), &["TRMNL"])
        .run_once()
        .await;

    match outcome {
        PassOutcome::Shipped(report) => assert_eq!(
            report.delivery,
            DeliveryOutcome::RemoteRejected {
                status: 503,
                body: "Service Unavailable".to_string()
            }
        ),
        other => panic!("unexpected outcome {:?}", other),
    }
    hook.assert_async().await;
}

#[tokio::test]
async fn test_missing_entity_state_is_skipped() {
    let mut hass = Server::new_async().await;
    let mut webhook = Server::new_async().await;

    let _labels = mock_label(&mut hass, "hall", r#"["sensor.gone","sensor.door"]"#).await;
    let _gone = hass
        .mock("GET", "/api/states/sensor.gone")
        .with_status(404)
        .create_async()
        .await;
    let _door = mock_state(
        &mut hass,
        "sensor.door",
        serde_json::json!({"entity_id": "sensor.door", "state": "closed",
                           "attributes": {"friendly_name": "Front door"}}),
    )
    .await;
    let hook = webhook
        .mock("POST", "/hook")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "merge_variables": {"hall": [{"name": "Front door", "value": "closed"}]}
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let outcome = blaster(hass.url(), format!("{}/hook", webhook.url()), &["hall"])
        .run_once()
        .await;

    assert!(outcome.is_success(), "unexpected outcome {:?}", outcome);
    hook.assert_async().await;
}
