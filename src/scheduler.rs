//! Periodic collection and delivery.
//!
//! A [`Blaster`] runs one pass immediately when started and then once per
//! interval until its [`BlasterHandle`] is stopped. Each pass runs on its own
//! task, so stopping only cancels the timer; a pass already sending is left
//! to finish.

use crate::aggregator::aggregate;
use crate::config::{validate, BlasterConfig, ConfigError};
use crate::payload::{shrink, OutboundPayload};
use crate::resolver::{LabelResolver, StateStore};
use crate::shipper::{DeliveryOutcome, WebhookShipper};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;


/// What a single pass did.
#[derive(Clone, Debug, PartialEq)]
pub enum PassOutcome {
    /// No group had a reportable entity (or nothing fit the ceiling);
    /// no request was made
    NoData,
    /// A payload was sent; see the delivery outcome
    Shipped(PassReport),
    /// The pass failed before sending
    Failed(String),
}

/// Details of a pass that reached the webhook.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    pub delivery: DeliveryOutcome,
    /// Records actually sent
    pub entity_count: usize,
    /// Groups actually sent
    pub group_count: usize,
    /// Encoded payload size
    pub size_bytes: usize,
    /// Records dropped to fit the ceiling
    pub evicted: usize,
}

impl PassOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PassOutcome::Shipped(report) if report.delivery.is_success())
    }
}

/// Status information for a running blaster.
#[derive(Clone, Debug, Default)]
pub struct BlastStatus {
    /// Start of the last completed pass
    pub last_run: Option<DateTime<Utc>>,
    /// Start of the last pass that delivered successfully
    pub last_success: Option<DateTime<Utc>>,
    /// Outcome of the last completed pass
    pub last_outcome: Option<PassOutcome>,
    /// Total number of completed passes
    pub run_count: u64,
    /// Passes that did not deliver successfully
    pub error_count: u64,
    /// Scheduled ticks skipped because a pass was still running
    pub skipped_overlaps: u64,
}

/// Collects labelled entity states and ships them to the webhook.
pub struct Blaster {
    config: BlasterConfig,
    resolver: Arc<dyn LabelResolver>,
    store: Arc<dyn StateStore>,
    shipper: WebhookShipper,
    status: Arc<Mutex<BlastStatus>>,
    /// Held for the duration of a pass
    in_flight: Arc<Mutex<()>>,
}

impl Blaster {
    /// Validates `config` and builds a blaster. Nothing runs until
    /// [`Blaster::start`] or [`Blaster::run_once`].
    pub fn new(
        config: BlasterConfig,
        resolver: Arc<dyn LabelResolver>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ConfigError> {
        validate(&config)?;
        let shipper = WebhookShipper::new(
            config.webhook.url.clone(),
            Duration::from_secs(config.webhook.timeout_seconds),
        )?;
        Ok(Self {
            config,
            resolver,
            store,
            shipper,
            status: Arc::new(Mutex::new(BlastStatus::default())),
            in_flight: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &BlasterConfig {
        &self.config
    }

    /// Returns a clone of the status tracker for external monitoring.
    pub fn status(&self) -> Arc<Mutex<BlastStatus>> {
        Arc::clone(&self.status)
    }

    /// Runs one pass now and records it in the status.
    pub async fn run_once(&self) -> PassOutcome {
        let _guard = self.in_flight.lock().await;
        self.run_tracked().await
    }

    async fn run_tracked(&self) -> PassOutcome {
        let started = Utc::now();
        let pass_id = Uuid::now_v7();
        let outcome = self
            .run_pass()
            .instrument(info_span!("pass", pass_id = %pass_id))
            .await;

        let mut status = self.status.lock().await;
        status.last_run = Some(started);
        status.run_count += 1;
        if outcome.is_success() {
            status.last_success = Some(started);
        } else {
            status.error_count += 1;
        }
        status.last_outcome = Some(outcome.clone());
        outcome
    }

    async fn run_pass(&self) -> PassOutcome {
        let groups = &self.config.sensor_groups;
        info!(groups = ?groups, "Starting entity processing");

        let payload = aggregate(groups, self.resolver.as_ref(), self.store.as_ref()).await;
        if payload.is_empty() {
            error!(groups = ?groups, "No entities found for groups");
            return PassOutcome::NoData;
        }
        info!(
            entities = payload.total_count(),
            groups = payload.len(),
            "Found entities across groups"
        );

        let timestamp = Utc::now();
        let shrunk = match shrink(payload, self.config.payload.max_bytes, timestamp) {
            Ok(shrunk) => shrunk,
            Err(e) => {
                error!(error = %e, "Failed to build payload");
                return PassOutcome::Failed(e.to_string());
            }
        };
        if shrunk.payload.is_empty() {
            error!(
                ceiling_bytes = self.config.payload.max_bytes,
                "No entities fit within the payload ceiling"
            );
            return PassOutcome::NoData;
        }

        let delivery = self
            .shipper
            .send(&OutboundPayload::new(&shrunk.payload, timestamp))
            .await;

        PassOutcome::Shipped(PassReport {
            delivery,
            entity_count: shrunk.payload.total_count(),
            group_count: shrunk.payload.len(),
            size_bytes: shrunk.final_bytes,
            evicted: shrunk.evicted,
        })
    }

    /// Starts the timer (non-blocking).
    ///
    /// The first pass runs immediately. A tick that fires while the previous
    /// pass is still running is skipped.
    pub fn start(self) -> BlasterHandle {
        let period = Duration::from_secs(self.config.schedule.interval_seconds);
        let title = self.config.title();
        let status = self.status();
        let blaster = Arc::new(self);

        info!(
            title = %title,
            groups = ?blaster.config.sensor_groups,
            interval_secs = period.as_secs(),
            "Starting blaster"
        );

        let timer = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let guard = match Arc::clone(&blaster.in_flight).try_lock_owned() {
                    Ok(guard) => guard,
                    Err(_) => {
                        warn!("Previous pass still running, skipping this cycle");
                        blaster.status.lock().await.skipped_overlaps += 1;
                        continue;
                    }
                };

                let pass = Arc::clone(&blaster);
                tokio::spawn(async move {
                    let _guard = guard;
                    pass.run_tracked().await;
                });
            }
        });

        BlasterHandle {
            timer: Some(timer),
            status,
        }
    }
}

/// Handle to a started [`Blaster`]. Stopping it cancels the timer.
pub struct BlasterHandle {
    timer: Option<JoinHandle<()>>,
    status: Arc<Mutex<BlastStatus>>,
}

impl BlasterHandle {
    pub fn status(&self) -> Arc<Mutex<BlastStatus>> {
        Arc::clone(&self.status)
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Cancels the timer so no further passes are scheduled.
    pub fn stop(mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("Blaster stopped");
        }
    }

    /// Stops this blaster and starts `next`, which runs immediately.
    pub fn reload(self, next: Blaster) -> BlasterHandle {
        self.stop();
        info!("Reloading blaster");
        next.start()
    }
}

impl Drop for BlasterHandle {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
