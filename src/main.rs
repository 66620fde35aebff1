use anyhow::{Context, Result};
use sensor_blaster::config::load_config;
use sensor_blaster::hass::HomeAssistant;
use sensor_blaster::{Blaster, BlasterConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor_blaster=info".into()),
        )
        .init();

    info!("Sensor Blaster starting...");

    let config_path =
        std::env::var("BLASTER_CONFIG").unwrap_or_else(|_| "blaster.toml".to_string());

    let blaster = build_blaster(&config_path).await?;
    let mut handle = blaster.start();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangup =
            signal(SignalKind::hangup()).context("Failed to listen for SIGHUP")?;
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("Failed to listen for ctrl_c signal")?;
                    break;
                }
                _ = hangup.recv() => {
                    info!(config = %config_path, "SIGHUP received, reloading configuration");
                    match build_blaster(&config_path).await {
                        Ok(next) => handle = handle.reload(next),
                        Err(e) => error!(error = %e, "Reload failed, keeping current configuration"),
                    }
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl_c signal")?;
    }

    info!("Shutdown signal received");
    handle.stop();
    info!("Sensor Blaster stopped");

    Ok(())
}

/// Load and validate configuration, then wire the Home Assistant backend.
async fn build_blaster(config_path: &str) -> Result<Blaster> {
    let file_config = if Path::new(config_path).exists() {
        load_config(config_path)?
    } else {
        warn!(config = %config_path, "Config file not found, using defaults and environment");
        BlasterConfig::default()
    };
    let config = file_config.with_env_overrides();

    info!(
        webhook_url = %config.webhook.url,
        groups = ?config.sensor_groups,
        hass_url = %config.home_assistant.url,
        interval_secs = config.schedule.interval_seconds,
        "Configuration loaded"
    );

    let hass = Arc::new(
        HomeAssistant::new(&config.home_assistant)
            .context("Failed to initialize Home Assistant client")?,
    );

    let known = hass.available_labels().await;
    for group in &config.sensor_groups {
        if !known.contains(group) {
            warn!(group = %group, "Sensor group is not a known Home Assistant label");
        }
    }

    let title = config.title();
    let blaster = Blaster::new(config, hass.clone(), hass)
        .with_context(|| format!("Invalid configuration for {}", title))?;
    Ok(blaster)
}
