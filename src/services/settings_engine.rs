// linkvault Settings Engine
// Loads service settings from a JSON file, applies environment overrides,
// and can write the effective settings back out.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::ServiceSettings;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "LINKVAULT_CONFIG";
/// Environment variable naming the directory that holds the database.
pub const DATA_DIR_ENV: &str = "LINKVAULT_DATA_DIR";
/// Environment variable overriding the listen address.
pub const BIND_ENV: &str = "LINKVAULT_BIND";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ServiceSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ServiceSettings;
    fn reset(&mut self);
    fn get_config_path(&self) -> &Path;
}

/// Settings engine implementation that reads settings as JSON from disk.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: ServiceSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise uses `$LINKVAULT_CONFIG`, then `<config dir>/settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path = path_override
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| platform::get_config_dir().join("settings.json"));

        Self {
            config_path,
            settings: ServiceSettings::default(),
        }
    }

    /// Applies `LINKVAULT_DATA_DIR` and `LINKVAULT_BIND` on top of `settings`.
    pub fn apply_env_overrides(settings: &mut ServiceSettings) {
        if let Some(dir) = env::var_os(DATA_DIR_ENV) {
            let file = Path::new(&settings.storage.database_path)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("linkvault.db"));
            settings.storage.database_path = PathBuf::from(dir).join(file).to_string_lossy().to_string();
        }
        if let Ok(bind) = env::var(BIND_ENV) {
            if !bind.trim().is_empty() {
                settings.server.bind_addr = bind.trim().to_string();
            }
        }
    }

    fn validate(settings: &ServiceSettings) -> Result<(), SettingsError> {
        if settings.fetcher.timeout_secs == 0 {
            return Err(SettingsError::InvalidValue("fetcher.timeoutSecs must be at least 1".to_string()));
        }
        if settings.ingestion.max_concurrency == 0 {
            return Err(SettingsError::InvalidValue(
                "ingestion.maxConcurrency must be at least 1".to_string(),
            ));
        }
        if settings.storage.database_path.trim().is_empty() {
            return Err(SettingsError::InvalidValue("storage.databasePath is empty".to_string()));
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, defaults are used. If the file exists but
    /// is malformed, returns a serialization error. Environment overrides are
    /// applied last.
    fn load(&mut self) -> Result<ServiceSettings, SettingsError> {
        let mut settings = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)
                .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
            serde_json::from_str(&content).map_err(|e| {
                SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
            })?
        } else {
            ServiceSettings::default()
        };

        Self::apply_env_overrides(&mut settings);
        Self::validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Resets the in-memory settings to defaults. The file is untouched until `save`.
    fn reset(&mut self) {
        self.settings = ServiceSettings::default();
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
