//! The schema-migration contract (spec §6). The concrete persistence
//! backend and schema-migration *engine* are out of scope (spec §1); this
//! module implements only the contract the core consumes: given any
//! `Recording` payload, return one at the current schema version,
//! idempotently, with step order preserved and defaults filled in.

use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Current schema version a `Recording` payload should be at.
pub const CURRENT_SCHEMA_VERSION: u64 = 3;

const DEFAULT_RECORDED_VIA: &str = "dom";
const DEFAULT_GLOBAL_DELAY_MS: u64 = 0;

/// `true` iff the payload is missing a required field, or its
/// `schemaVersion` is older than [`CURRENT_SCHEMA_VERSION`] (spec §8).
pub fn needs_migration(payload: &Value) -> bool {
    let Some(obj) = payload.as_object() else {
        return true;
    };

    let version_is_current = obj
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| v >= CURRENT_SCHEMA_VERSION)
        .unwrap_or(false);

    let has_required = obj.contains_key("id") && obj.get("actions").map(Value::is_array).unwrap_or(false);

    !(version_is_current && has_required && obj.contains_key("recordedVia") && obj.contains_key("globalDelayMs"))
}

/// Migrates a `Recording` payload to the current schema version.
///
/// Idempotent: `migrate(migrate(payload)) == migrate(payload)` (spec §8).
/// Step IDs and order are preserved exactly; only missing fields are added
/// and `schemaVersion` is bumped.
pub fn migrate(payload: Value) -> Result<Value> {
    let mut obj = payload
        .as_object()
        .cloned()
        .ok_or_else(|| Error::Migration("recording payload must be a JSON object".into()))?;

    if !obj.contains_key("id") {
        return Err(Error::Migration("recording payload is missing required field `id`".into()));
    }
    if !obj.get("actions").map(Value::is_array).unwrap_or(false) {
        return Err(Error::Migration(
            "recording payload is missing required array field `actions`".into(),
        ));
    }

    obj.entry("recordedVia".to_string())
        .or_insert_with(|| json!(DEFAULT_RECORDED_VIA));
    obj.entry("globalDelayMs".to_string())
        .or_insert_with(|| json!(DEFAULT_GLOBAL_DELAY_MS));
    obj.insert("schemaVersion".to_string(), json!(CURRENT_SCHEMA_VERSION));

    Ok(Value::Object(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_payload() -> Value {
        json!({
            "id": "rec-1",
            "actions": [
                {"stepNumber": 1, "kind": "click"},
                {"stepNumber": 2, "kind": "input"}
            ]
        })
    }

    #[test]
    fn legacy_payload_needs_migration() {
        assert!(needs_migration(&legacy_payload()));
    }

    #[test]
    fn migration_fills_defaults_and_bumps_version() {
        let migrated = migrate(legacy_payload()).unwrap();
        assert_eq!(migrated["recordedVia"], json!("dom"));
        assert_eq!(migrated["globalDelayMs"], json!(0));
        assert_eq!(migrated["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));
        assert!(!needs_migration(&migrated));
    }

    #[test]
    fn migration_preserves_step_order_and_ids() {
        let migrated = migrate(legacy_payload()).unwrap();
        let actions = migrated["actions"].as_array().unwrap();
        assert_eq!(actions[0]["stepNumber"], json!(1));
        assert_eq!(actions[1]["stepNumber"], json!(2));
    }

    #[test]
    fn migration_is_idempotent() {
        let once = migrate(legacy_payload()).unwrap();
        let twice = migrate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn migration_does_not_overwrite_explicit_values() {
        let mut payload = legacy_payload();
        payload["recordedVia"] = json!("vision");
        payload["globalDelayMs"] = json!(500);
        let migrated = migrate(payload).unwrap();
        assert_eq!(migrated["recordedVia"], json!("vision"));
        assert_eq!(migrated["globalDelayMs"], json!(500));
    }

    #[test]
    fn missing_id_is_rejected() {
        let payload = json!({"actions": []});
        assert!(migrate(payload).is_err());
    }

    #[test]
    fn missing_actions_is_rejected() {
        let payload = json!({"id": "rec-1"});
        assert!(migrate(payload).is_err());
    }
}
