//! RPC method handler for the autorefresh bridge protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches method calls to the `App`.
//! Side effects are not part of the result; they stay queued on the
//! [`QueuedHost`] until the server drains them.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::App;
use crate::host::{EntityDescriptor, QueuedHost};
use crate::services::command_dispatch::CommandDispatchTrait;
use crate::services::scheduler::FireOutcome;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::command::Command;
use crate::types::entity::EntityId;
use crate::types::event::{LifecycleEvent, PageMessage};
use crate::types::settings::Settings;

/// The app as driven by the bridge.
pub type BridgeApp = App<QueuedHost>;

fn param<T: DeserializeOwned>(params: &Value, name: &str) -> Result<T, String> {
    let value = params.get(name).cloned().ok_or(format!("missing {}", name))?;
    serde_json::from_value(value).map_err(|e| format!("invalid {}: {}", name, e))
}

fn entity_id(params: &Value) -> Result<EntityId, String> {
    params
        .get("entityId")
        .and_then(|v| v.as_i64())
        .map(EntityId)
        .ok_or_else(|| "missing entityId".to_string())
}

fn outcome_json(outcome: FireOutcome) -> Value {
    match outcome {
        FireOutcome::Vanished => json!({"outcome": "vanished"}),
        FireOutcome::Skipped => json!({"outcome": "skipped"}),
        FireOutcome::Deferred(d) => json!({"outcome": "deferred", "delayMs": d.as_millis() as u64}),
        FireOutcome::Reload => json!({"outcome": "reload"}),
    }
}

/// Dispatch a method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<BridgeApp>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Lifecycle ───
        "startup" => {
            let entities: Vec<EntityDescriptor> = match params.get("entities") {
                Some(_) => param(params, "entities")?,
                None => Vec::new(),
            };
            let focused = params.get("focusedWindow").and_then(|v| v.as_i64());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            for desc in entities {
                a.host.register(desc);
            }
            a.host.set_focused_window(focused);
            let report = a.startup().map_err(|e| e.to_string())?;
            Ok(json!({
                "migrated": report.migrated,
                "rememberedUrls": report.remembered_urls,
                "entities": report.entities,
            }))
        }
        "event" => {
            let event: LifecycleEvent = serde_json::from_value(params.clone())
                .map_err(|e| format!("invalid event: {}", e))?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.handle_event(event).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "message" => {
            let id = entity_id(params)?;
            let message: PageMessage = param(params, "message")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.handle_page_message(id, message).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "command" => {
            let id = entity_id(params)?;
            let command: Command = param(params, "command")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.dispatch(id, command).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Timers ───
        "timers.fire" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let fired = a.fire_due_timers().map_err(|e| e.to_string())?;
            let arr: Vec<Value> = fired
                .into_iter()
                .map(|(key, outcome)| {
                    let mut v = outcome_json(outcome);
                    v["key"] = json!(key.as_str());
                    v
                })
                .collect();
            Ok(json!(arr))
        }
        "timers.next" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"deadline": a.scheduler.next_deadline()}))
        }

        // ─── Entities ───
        "entity.get" => {
            let id = entity_id(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let state = a.entity(id).map(serde_json::to_value).transpose().map_err(|e| e.to_string())?;
            Ok(json!({"state": state}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let settings = a.settings_engine.get_settings();
            let json_val = serde_json::to_value(settings).map_err(|e| e.to_string())?;
            Ok(json_val)
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.replace" => {
            let settings: Settings = param(params, "settings")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.replace(settings).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "settings.reset" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine.reset().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
