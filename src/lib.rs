//! Sensor Blaster - periodic labelled sensor summaries for a TRMNL webhook.
//!
//! # Architecture
//!
//! ```text
//! Home Assistant (labels, entity states)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Aggregator                         │
//! │  - Resolve labels to entity ids          │
//! │  - Drop unknown/unavailable states       │
//! │  - Format name/value records             │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Shrinker                           │
//! │  - Evict records until ≤ 2048 bytes      │
//! └─────────────────────────────────────────┘
//!          ↓
//!      Webhook (POST, 30 s timeout)
//! ```
//!
//! A [`Blaster`] runs the pipeline once on start and then every
//! `schedule.interval_seconds` until its [`BlasterHandle`] is stopped.

// Configuration file, env overrides and validation
pub mod config;

// Entity states and record formatting
pub mod entity;

// Host seams (labels, states)
pub mod resolver;

// Grouped payload, wire encoding and size ceiling
pub mod payload;

// Aggregation pass
pub mod aggregator;

// Webhook delivery
pub mod shipper;

// Home Assistant REST backend
pub mod hass;

// Periodic runner
pub mod scheduler;

pub use config::{BlasterConfig, ConfigError};
pub use entity::{EntityRecord, EntityState};
pub use resolver::{LabelResolver, StateStore};
pub use scheduler::{BlastStatus, Blaster, BlasterHandle, PassOutcome, PassReport};
pub use shipper::DeliveryOutcome;
