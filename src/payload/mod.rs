//! Grouped webhook payload and its wire encoding.
//!
//! The webhook expects every group to appear as a top-level key under
//! `merge_variables`, next to three metadata keys:
//!
//! ```text
//! { "merge_variables": {
//!     "<group>": [ {"name": "...", "value": "..."}, ... ],
//!     "timestamp": "<ISO-8601>",
//!     "total_count": <int>,
//!     "groups": ["<group>", ...]
//! }}
//! ```

use crate::entity::EntityRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

mod shrinker;

pub use shrinker::{shrink, Shrunk};

/// Hard ceiling for the compact JSON encoding of an outbound payload.
pub const MAX_PAYLOAD_BYTES: usize = 2048;

/// Metadata keys written next to the groups inside `merge_variables`.
pub const RESERVED_KEYS: &[&str] = &["timestamp", "total_count", "groups"];

/// Returns true if a group label would collide with a metadata key.
pub fn is_reserved_label(label: &str) -> bool {
    RESERVED_KEYS.contains(&label)
}

/// Ordered mapping of group label to its records.
///
/// A label is present only while it has at least one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedPayload {
    groups: Vec<(String, Vec<EntityRecord>)>,
}

impl GroupedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group at the end of the mapping.
    ///
    /// Empty record lists and reserved labels are ignored and `false` is
    /// returned. An existing label is replaced in place.
    pub fn insert(&mut self, label: impl Into<String>, records: Vec<EntityRecord>) -> bool {
        let label = label.into();
        if records.is_empty() || is_reserved_label(&label) {
            return false;
        }
        match self.groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = records,
            None => self.groups.push((label, records)),
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Sum of record counts across all groups.
    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }

    /// Group labels in insertion order.
    pub fn labels(&self) -> Vec<String> {
        self.groups.iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&[EntityRecord]> {
        self.groups
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntityRecord])> {
        self.groups
            .iter()
            .map(|(label, records)| (label.as_str(), records.as_slice()))
    }

    /// Index of the group with the most records; the first one wins ties.
    fn largest_group(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (index, (_, records)) in self.groups.iter().enumerate() {
            match best {
                Some((_, count)) if records.len() <= count => {}
                _ => best = Some((index, records.len())),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Removes the last record of the largest group, dropping the group
    /// once it is empty. Returns the evicted label and record.
    fn evict_one(&mut self) -> Option<(String, EntityRecord)> {
        let index = self.largest_group()?;
        let record = self.groups[index].1.pop()?;
        let label = if self.groups[index].1.is_empty() {
            self.groups.remove(index).0
        } else {
            self.groups[index].0.clone()
        };
        Some((label, record))
    }
}

/// Wire envelope built from a [`GroupedPayload`] plus pass metadata.
///
/// `total_count` and `groups` are derived from the borrowed payload at
/// serialization time, so they always match its current contents.
#[derive(Clone, Copy, Debug)]
pub struct OutboundPayload<'a> {
    payload: &'a GroupedPayload,
    timestamp: DateTime<Utc>,
}

impl<'a> OutboundPayload<'a> {
    pub fn new(payload: &'a GroupedPayload, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }

    pub fn groups(&self) -> &GroupedPayload {
        self.payload
    }

    /// Compact JSON encoding (no insignificant whitespace).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to serialize outbound payload")
    }

    /// UTF-8 byte length of the compact JSON encoding.
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(self.to_bytes()?.len())
    }
}

impl Serialize for OutboundPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("merge_variables", &MergeVariables(self))?;
        map.end()
    }
}

struct MergeVariables<'a>(&'a OutboundPayload<'a>);

impl Serialize for MergeVariables<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payload = self.0.payload;
        let mut map = serializer.serialize_map(Some(payload.len() + RESERVED_KEYS.len()))?;
        for (label, records) in payload.iter() {
            map.serialize_entry(label, records)?;
        }
        map.serialize_entry(
            "timestamp",
            &self.0.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        map.serialize_entry("total_count", &payload.total_count())?;
        map.serialize_entry("groups", &payload.labels())?;
        map.end()
    }
}
