//! Seams to the host platform: label lookup and entity state reads.

use crate::entity::EntityState;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, error};

/// Resolves a group label to the entities currently carrying it.
///
/// Implementations may fail independently per call; callers treat a failed
/// label as empty and carry on with the rest.
///
/// # Example
/// ```no_run
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use sensor_blaster::LabelResolver;
///
/// struct Fixed;
///
/// #[async_trait]
/// impl LabelResolver for Fixed {
///     async fn label_entities(&self, label: &str) -> Result<Vec<String>> {
///         Ok(vec![format!("sensor.{}_temp", label)])
///     }
/// }
/// ```
#[async_trait]
pub trait LabelResolver: Send + Sync {
    /// Returns the ids of every entity tagged with `label`.
    ///
    /// May contain duplicates; order is preserved by the caller.
    async fn label_entities(&self, label: &str) -> Result<Vec<String>>;
}

/// Read access to current entity states.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the current state of `entity_id`, or `None` if the host
    /// does not know the entity.
    async fn get(&self, entity_id: &str) -> Result<Option<EntityState>>;
}

/// Entity ids for one group label.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedGroup {
    pub label: String,
    pub entity_ids: Vec<String>,
}

/// Resolve a single label, de-duplicating ids in first-seen order.
///
/// Errors are logged and yield an empty list.
pub async fn resolve_group(resolver: &dyn LabelResolver, label: &str) -> Vec<String> {
    match resolver.label_entities(label).await {
        Ok(ids) => {
            let mut seen = HashSet::new();
            let unique: Vec<String> = ids
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();
            debug!(group = %label, count = unique.len(), "Resolved group entities");
            unique
        }
        Err(e) => {
            error!(group = %label, error = %e, "Error processing group");
            Vec::new()
        }
    }
}

/// Resolve every label in order, omitting groups with no entities.
pub async fn resolve(resolver: &dyn LabelResolver, labels: &[String]) -> Vec<ResolvedGroup> {
    let mut resolved = Vec::with_capacity(labels.len());
    for label in labels {
        let entity_ids = resolve_group(resolver, label).await;
        if entity_ids.is_empty() {
            debug!(group = %label, "No entities found in group");
            continue;
        }
        resolved.push(ResolvedGroup {
            label: label.clone(),
            entity_ids,
        });
    }
    resolved
}
