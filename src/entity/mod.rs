use serde::{Deserialize, Serialize};
use tracing::debug;


/// Sentinel state reported for an entity whose value has never been read.
pub const STATE_UNKNOWN: &str = "unknown";
/// Sentinel state reported for an entity whose device is offline.
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Snapshot of a host entity's current state.
///
/// Owned by the host's state store; read-only here.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityState {
    /// Host entity identifier (e.g., "sensor.kitchen_temp")
    pub entity_id: String,
    /// Display name, if the host has one
    pub friendly_name: Option<String>,
    /// Raw state value (numeric literal, free text, or a sentinel)
    pub state: String,
    /// Unit suffix (e.g., "°C", "%")
    pub unit_of_measurement: Option<String>,
}

impl EntityState {
    /// Returns true if the state carries an actual reading.
    pub fn is_reportable(&self) -> bool {
        !is_sentinel(&self.state)
    }
}

/// Minimal name/value projection sent to the webhook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub value: String,
}

fn is_sentinel(raw: &str) -> bool {
    raw == STATE_UNKNOWN || raw == STATE_UNAVAILABLE
}

/// Project an entity state into its outbound record.
///
/// Name is the friendly name, or the last `.` segment of the entity id.
/// See [`render_value`] for value formatting.
pub fn format_record(state: &EntityState) -> EntityRecord {
    let name = match &state.friendly_name {
        Some(name) => name.clone(),
        None => object_id(&state.entity_id).to_string(),
    };
    let value = render_value(&state.state, state.unit_of_measurement.as_deref());

    let record = EntityRecord { name, value };
    debug!(
        entity_id = %state.entity_id,
        name = %record.name,
        value = %record.value,
        "Formatted entity record"
    );
    record
}

/// Render a raw state value with its unit.
///
/// - `unknown` / `unavailable` pass through with no unit
/// - integral numbers drop the fraction ("21.0" → "21")
/// - other numbers keep one fractional digit, rounded to nearest
///   with ties to even on the exact binary value ("21.55" → "21.6")
/// - anything else (including "inf"/"nan") is kept verbatim
///
/// The unit, when present, is appended without a separator.
pub fn render_value(raw: &str, unit: Option<&str>) -> String {
    if is_sentinel(raw) {
        return raw.to_string();
    }
    let unit = unit.unwrap_or("");

    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() && number.fract() == 0.0 => {
            // Normalise -0 so it renders as "0"
            let number = if number == 0.0 { 0.0 } else { number };
            format!("{:.0}{}", number, unit)
        }
        Ok(number) if number.is_finite() => format!("{:.1}{}", number, unit),
        _ => format!("{}{}", raw, unit),
    }
}

/// Final `.`-separated segment of an entity id ("sensor.temp" → "temp").
fn object_id(entity_id: &str) -> &str {
    entity_id.rsplit('.').next().unwrap_or(entity_id)
}
