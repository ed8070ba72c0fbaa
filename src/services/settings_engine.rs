// Settings Engine
// Manages global settings: loading with fallback to defaults, wholesale replacement,
// updating individual values, and resetting to defaults.
// Settings are stored as a JSON document under the `settings` storage key.

use crate::database::storage::{Storage, SETTINGS_KEY};
use crate::types::errors::SettingsError;
use crate::types::settings::{Settings, CONFIG_VERSION};

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> &Settings;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &Settings;
    fn replace(&mut self, settings: Settings) -> Result<(), SettingsError>;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
}

/// Settings engine backed by the key/value store.
pub struct SettingsEngine {
    storage: Storage,
    settings: Settings,
}

impl SettingsEngine {
    /// Creates an engine holding the built-in defaults until [`SettingsEngineTrait::load`] runs.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            settings: Settings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads the persisted settings.
    ///
    /// A missing record, an unreadable record, or a storage failure all leave
    /// the built-in defaults in place; none of them is fatal.
    fn load(&mut self) -> &Settings {
        self.settings = match self.storage.get_json::<Settings>(SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default settings");
                Settings::default()
            }
        };
        &self.settings
    }

    fn save(&self) -> Result<(), SettingsError> {
        self.storage.set_json(SETTINGS_KEY, &self.settings)?;
        Ok(())
    }

    fn get_settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces every setting at once, as the options page does on save.
    fn replace(&mut self, mut settings: Settings) -> Result<(), SettingsError> {
        settings.version = CONFIG_VERSION;
        self.settings = settings;
        self.save()
    }

    /// Updates an individual setting by dot-notation key path.
    ///
    /// Converts the current settings to a `serde_json::Value`, navigates the
    /// dot-separated key path, updates the target value, then deserializes
    /// back into `Settings`. Saves after a successful update.
    ///
    /// # Examples
    /// - `"neverConfirmPost"` → updates `settings.never_confirm_post`
    /// - `"defaults.smart"` → updates `settings.defaults.smart`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        if key == "version" {
            return Err(SettingsError::InvalidKey("version is read-only".to_string()));
        }

        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                if i == parts.len() - 1 {
                    match current {
                        serde_json::Value::Object(map) => {
                            if !map.contains_key(*part) {
                                return Err(SettingsError::InvalidKey(format!(
                                    "Key '{}' not found in settings",
                                    key
                                )));
                            }
                            map.insert(part.to_string(), value.clone());
                        }
                        _ => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Cannot navigate to key '{}': intermediate value is not an object",
                                key
                            )));
                        }
                    }
                } else {
                    current = match current.get_mut(*part) {
                        Some(v) => v,
                        None => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Key '{}' not found in settings",
                                key
                            )));
                        }
                    };
                }
            }
        }

        let new_settings: Settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()
    }

    /// Resets all settings to the built-in defaults and saves.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = Settings::default();
        self.save()
    }
}
