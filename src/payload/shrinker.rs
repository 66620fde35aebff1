use super::{GroupedPayload, OutboundPayload};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Result of fitting a payload under the size ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct Shrunk {
    /// Remaining groups; empty if nothing fit
    pub payload: GroupedPayload,
    /// Encoded size before any eviction
    pub initial_bytes: usize,
    /// Encoded size of the returned payload
    pub final_bytes: usize,
    /// Number of records removed
    pub evicted: usize,
}

/// Greedily evict records until the encoded payload fits `ceiling_bytes`.
///
/// Each step pops the last record of the group with the most records (first
/// group wins ties) and drops groups that become empty. The result is either
/// at most `ceiling_bytes` long or has no groups left. No attempt is made to
/// keep an optimal subset.
pub fn shrink(
    mut payload: GroupedPayload,
    ceiling_bytes: usize,
    timestamp: DateTime<Utc>,
) -> Result<Shrunk> {
    let initial_bytes = OutboundPayload::new(&payload, timestamp).encoded_len()?;
    let mut size = initial_bytes;
    let mut evicted = 0;

    if size > ceiling_bytes {
        warn!(
            size_bytes = size,
            ceiling_bytes = ceiling_bytes,
            "Payload exceeds size ceiling, truncating groups"
        );
    }

    while size > ceiling_bytes {
        let Some((label, record)) = payload.evict_one() else {
            break;
        };
        evicted += 1;
        size = OutboundPayload::new(&payload, timestamp).encoded_len()?;
        debug!(
            group = %label,
            name = %record.name,
            size_bytes = size,
            "Evicted record"
        );
    }

    if evicted > 0 {
        info!(
            remaining = payload.total_count(),
            evicted = evicted,
            size_bytes = size,
            "Reduced payload"
        );
    }

    Ok(Shrunk {
        payload,
        initial_bytes,
        final_bytes: size,
        evicted,
    })
}
