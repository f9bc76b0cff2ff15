use anyhow::Result;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::StorageSettings;

const APP_NAME: &str = "RemoteStorageCache";
const CONFIG_FILE: &str = "settings.json";

/// Returns the platform-specific configuration directory for the library.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "remotestoragecache", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the settings file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the settings from `path`, or from the platform config file.
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// migrated field by field, falling back to defaults if that fails too.
pub fn load_config(path: Option<&Path>) -> Result<StorageSettings> {
    let config_path = resolve(path)?;

    if !config_path.exists() {
        tracing::info!(
            "Settings file not found, creating default settings at {:?}",
            config_path
        );
        let default_config = StorageSettings::default();
        save_config(&default_config, Some(config_path.as_path()))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<StorageSettings>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded settings from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse settings file at {:?}: {}. Falling back to default settings.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|_| Ok(StorageSettings::default()))
        }
    }
}

/// Fills every missing or null field of an older settings file from the
/// defaults and parses the result.
fn migrate_legacy_config(config_content: &str) -> Result<StorageSettings> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Settings are not a JSON object"))?;

    let defaults = serde_json::to_value(StorageSettings::default())?;
    let Value::Object(defaults) = defaults else {
        anyhow::bail!("Default settings did not serialize to an object");
    };

    for (key, default_val) in defaults {
        if obj.get(&key).map_or(true, Value::is_null) {
            obj.insert(key, default_val);
        }
    }

    let migrated_config: StorageSettings = serde_json::from_value(value)?;
    tracing::info!("Successfully migrated legacy settings");
    Ok(migrated_config)
}

/// Saves the settings to `path`, or to the platform config file.
pub fn save_config(config: &StorageSettings, path: Option<&Path>) -> Result<()> {
    let config_path = resolve(path)?;

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, config_json)?;
    tracing::info!("Saved settings to {:?}", config_path);

    Ok(())
}

/// Exports the settings to a user-specified JSON file.
pub fn export_config(config: &StorageSettings, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported settings to {:?}", export_path);
    Ok(())
}

/// Imports settings from a user-specified JSON file, migrating older formats.
pub fn import_config(import_path: &Path) -> Result<StorageSettings> {
    let config_content = fs::read_to_string(import_path)?;
    match serde_json::from_str::<StorageSettings>(&config_content) {
        Ok(config) => {
            tracing::info!("Imported settings from {:?}", import_path);
            Ok(config)
        }
        Err(_) => {
            tracing::info!("Importing legacy settings format from {:?}", import_path);
            migrate_legacy_config(&config_content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.json");

        let loaded = load_config(Some(path.as_path())).unwrap();
        assert_eq!(loaded, StorageSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = StorageSettings::default();
        settings.banned_files.push("Bad_Tune.sid".to_string());
        settings.search_weights.title = 20;

        save_config(&settings, Some(path.as_path())).unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap(), settings);
    }

    #[test]
    fn test_legacy_file_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "favorites_root": "/my-favs", "banned_files": null }"#,
        )
        .unwrap();

        let loaded = load_config(Some(path.as_path())).unwrap();
        assert_eq!(loaded.favorites_root.as_str(), "/my-favs/");
        assert_eq!(loaded.banned_files, StorageSettings::default().banned_files);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        assert_eq!(load_config(Some(path.as_path())).unwrap(), StorageSettings::default());
    }

    #[test]
    fn test_export_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        let mut settings = StorageSettings::default();
        settings.history_capacity = None;

        export_config(&settings, &path).unwrap();
        assert_eq!(import_config(&path).unwrap(), settings);
    }
}
