//! Migration of entity state saved across a restart.
//!
//! Right before the process restarts for an update, every [`EntityState`] is
//! written to the `upgrade` storage key together with the configuration
//! version. On the next start each saved record is brought up to the current
//! schema by a chain of per-version steps, then merged by field name onto a
//! fresh default record: fields the current schema no longer has are dropped,
//! and fields it introduced keep their defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::entity::{EntityId, EntityState, TimerKey};
use crate::types::errors::MigrationError;
use crate::types::settings::{EntityDefaults, CONFIG_VERSION};

/// Highest snapshot version this build can read.
pub const CURRENT_VERSION: u32 = CONFIG_VERSION;

/// Fields that always come from the fresh record, never from the saved one.
const IDENTITY_FIELDS: [&str; 2] = ["entityId", "timerKey"];

/// The transient `upgrade` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSnapshot {
    #[serde(default)]
    pub version: u32,
    /// `[timerKey, record]` pairs.
    pub state: Vec<(String, Value)>,
}

impl UpgradeSnapshot {
    /// Captures `states` at the current version.
    pub fn capture<'a>(states: impl IntoIterator<Item = &'a EntityState>) -> Result<Self, MigrationError> {
        let mut state = Vec::new();
        for s in states {
            let record = serde_json::to_value(s).map_err(|e| MigrationError::Malformed(e.to_string()))?;
            state.push((s.timer_key.to_string(), record));
        }
        Ok(Self {
            version: CURRENT_VERSION,
            state,
        })
    }

    pub fn parse(value: Value) -> Result<Self, MigrationError> {
        serde_json::from_value(value).map_err(|e| MigrationError::Malformed(e.to_string()))
    }

    pub fn is_supported(&self) -> bool {
        self.version <= CURRENT_VERSION
    }
}

/// Migrates one saved record written at `from_version`.
///
/// The entity id is read from the record; `key` (the record's timer key) is
/// used when the record itself does not carry one.
pub fn migrate_record(
    key: &str,
    record: Value,
    from_version: u32,
    defaults: &EntityDefaults,
) -> Result<EntityState, MigrationError> {
    let saved = upgrade_record(record, from_version)?;

    let id = saved
        .get("entityId")
        .and_then(Value::as_i64)
        .map(EntityId)
        .or_else(|| serde_json::from_value::<TimerKey>(Value::String(key.to_string())).ok()?.entity_id())
        .ok_or_else(|| MigrationError::Malformed(format!("record {} has no entity id", key)))?;

    Ok(merge_by_name(EntityState::new(id, defaults), &saved))
}

/// Runs every per-version step between `from_version` and the current schema.
pub fn upgrade_record(record: Value, from_version: u32) -> Result<Map<String, Value>, MigrationError> {
    if from_version > CURRENT_VERSION {
        return Err(MigrationError::UnsupportedVersion(from_version));
    }
    let Value::Object(mut fields) = record else {
        return Err(MigrationError::Malformed("record is not an object".to_string()));
    };

    if from_version < 2 {
        fields = migrate_v1_to_v2(fields);
    }

    Ok(fields)
}

/// V1 → V2: legacy field names, and scroll offsets folded into one optional position.
fn migrate_v1_to_v2(mut fields: Map<String, Value>) -> Map<String, Value> {
    const RENAMES: [(&str, &str); 8] = [
        ("tabId", "entityId"),
        ("alarmName", "timerKey"),
        ("nocache", "noCache"),
        ("reqMethod", "requestMethod"),
        ("formData", "formSnapshot"),
        ("postConfirmed", "resendConfirmed"),
        ("url", "currentUrl"),
        ("reloadByAddon", "reloadInitiatedBySystem"),
    ];

    for (old, new) in RENAMES {
        if let Some(value) = fields.remove(old) {
            fields.insert(new.to_string(), value);
        }
    }

    let x = fields.remove("scrollX").and_then(|v| v.as_f64());
    let y = fields.remove("scrollY").and_then(|v| v.as_f64());
    let scroll = match (x, y) {
        (Some(x), Some(y)) => serde_json::json!({ "x": x, "y": y }),
        _ => Value::Null,
    };
    fields.insert("scroll".to_string(), scroll);

    fields
}

/// Copies every field present in both `fresh` and `saved` onto `fresh`.
///
/// A saved field whose value no longer fits the current type is skipped and
/// keeps its fresh value.
pub fn merge_by_name(fresh: EntityState, saved: &Map<String, Value>) -> EntityState {
    let Ok(Value::Object(mut merged)) = serde_json::to_value(&fresh) else {
        return fresh;
    };

    let keys: Vec<String> = merged
        .keys()
        .filter(|k| !IDENTITY_FIELDS.contains(&k.as_str()))
        .cloned()
        .collect();

    for key in keys {
        let Some(saved_value) = saved.get(&key) else {
            continue;
        };
        let previous = merged.insert(key.clone(), saved_value.clone());
        if serde_json::from_value::<EntityState>(Value::Object(merged.clone())).is_err() {
            tracing::warn!(entity = %fresh.entity_id, field = %key, "dropping saved field of incompatible type");
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(fresh)
}
