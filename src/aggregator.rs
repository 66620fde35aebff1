//! Builds the grouped payload from host state.

use crate::entity::{format_record, EntityRecord};
use crate::payload::{is_reserved_label, GroupedPayload};
use crate::resolver::{resolve, LabelResolver, StateStore};
use tracing::{debug, error, warn};

/// Collect formatted records for every group label, in order.
///
/// Entities without a state, or whose state is `unknown` / `unavailable`,
/// are skipped. Groups left with no records are omitted, so an empty result
/// means there is nothing to send this cycle.
pub async fn aggregate(
    labels: &[String],
    resolver: &dyn LabelResolver,
    store: &dyn StateStore,
) -> GroupedPayload {
    let mut payload = GroupedPayload::new();

    for group in resolve(resolver, labels).await {
        if is_reserved_label(&group.label) {
            warn!(group = %group.label, "Group label collides with payload metadata, skipping");
            continue;
        }

        let mut records: Vec<EntityRecord> = Vec::with_capacity(group.entity_ids.len());
        for entity_id in &group.entity_ids {
            let state = match store.get(entity_id).await {
                Ok(Some(state)) => state,
                Ok(None) => {
                    debug!(entity_id = %entity_id, group = %group.label, "Skipping entity (state: not found)");
                    continue;
                }
                Err(e) => {
                    error!(entity_id = %entity_id, group = %group.label, error = %e, "Failed to read entity state");
                    continue;
                }
            };

            if !state.is_reportable() {
                debug!(
                    entity_id = %entity_id,
                    group = %group.label,
                    state = %state.state,
                    "Skipping entity"
                );
                continue;
            }

            records.push(format_record(&state));
        }

        let count = records.len();
        if payload.insert(group.label.clone(), records) {
            debug!(group = %group.label, count = count, "Added entities to group");
        }
    }

    payload
}
