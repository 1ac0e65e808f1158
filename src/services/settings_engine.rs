// Vault Settings Engine
// Loads, saves and edits user settings stored as a JSON file.
// The file lives in the platform config directory unless VAULT_CONFIG points elsewhere.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::VaultSettings;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "VAULT_CONFIG";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<VaultSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &VaultSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as pretty-printed JSON.
pub struct SettingsEngine {
    config_path: String,
    settings: VaultSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// Path resolution: `path_override`, then `$VAULT_CONFIG`, then
    /// `<platform config dir>/settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .or_else(|| std::env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| {
                platform::get_config_dir()
                    .join("settings.json")
                    .to_string_lossy()
                    .to_string()
            });

        Self {
            config_path,
            settings: VaultSettings::default(),
        }
    }

    /// Writes `value` at the dot-separated `key` inside `root`.
    fn assign_path(root: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = match parts.split_last() {
            Some(split) => split,
            None => return Err(SettingsError::InvalidKey("Key cannot be empty".to_string())),
        };

        let mut current = root;
        for part in parents {
            current = current.get_mut(*part).ok_or_else(|| {
                SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))
            })?;
        }

        match current {
            Value::Object(map) => {
                if !map.contains_key(*last) {
                    return Err(SettingsError::InvalidKey(format!(
                        "Key '{}' not found in settings",
                        key
                    )));
                }
                map.insert(last.to_string(), value);
                Ok(())
            }
            _ => Err(SettingsError::InvalidKey(format!(
                "Cannot navigate to key '{}': intermediate value is not an object",
                key
            ))),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from disk; a missing file yields defaults.
    fn load(&mut self) -> Result<VaultSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = VaultSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: VaultSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key (`"appearance.view_mode"`,
    /// `"sync.strategy"`, ...) and saves.
    ///
    /// The edited tree is deserialized back into `VaultSettings`, so a value of
    /// the wrong shape is rejected and leaves the settings untouched.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.trim().is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        Self::assign_path(&mut json_value, key, value)?;

        let new_settings: VaultSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = VaultSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
