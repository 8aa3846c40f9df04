//! Flat key→value settings store for the armouryd daemon.
//!
//! The daemon core only needs typed get/set over a durable map: mode values,
//! auto flags, per-power-state targets, hotkey bindings and custom command
//! strings. The external settings surface writes the same file; a watcher
//! service reloads it when that happens.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::RwLock;

/// A single settings value. The store is deliberately untyped beyond
/// integer-or-string; every consumer goes through the typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
}

/// The flat settings map, serialized as a single YAML mapping.
///
/// # Example
///
/// ```yaml
/// performance_mode: 0
/// gpu_auto: 1
/// gpu_plugged: 1
/// gpu_battery: 0
/// charge_limit: 80
/// m3: 3
/// m3_custom: "playerctl play-pause"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: HashMap<String, Value>,
}

impl Settings {
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), Value::Int(value));
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::Str(value.to_string()));
    }
}

fn locate_settings() -> Option<PathBuf> {
    if let Ok(env_path) = env::var("ARMOURYD_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
    {
        cfg_dir.push("armouryd/settings.yml");
        if cfg_dir.exists() {
            return Some(cfg_dir);
        }
    }

    let etc = Path::new("/etc/armouryd/settings.yml");
    if etc.exists() {
        return Some(etc.to_path_buf());
    }

    None
}

fn default_settings_path() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("armouryd/settings.yml")
}

/// Settings manager owning the shared store and its file location.
///
/// All services hold a clone; reads take a snapshot under a read lock,
/// read-modify-write sequences (mode cycling) go through [`set_int`] and
/// [`save`] under the write lock, which is the mutual exclusion the
/// dispatch path requires.
///
/// [`set_int`]: SettingsManager::set_int
/// [`save`]: SettingsManager::save
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsManager {
    /// Creates a manager around an in-memory store. Used by tests and by
    /// `load` once the file has been located.
    pub fn new(settings: Settings, path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the given path or the standard locations:
    /// `ARMOURYD_CONFIG`, `$XDG_CONFIG_HOME/armouryd/settings.yml`,
    /// `/etc/armouryd/settings.yml`. A missing file is not an error; the
    /// daemon starts with an empty store and hard-coded defaults, and the
    /// first cycle writes the file.
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let settings_path = path.or_else(locate_settings);

        match settings_path {
            Some(p) if p.exists() => {
                info!("Loading settings from: {}", p.display());
                let settings = Self::read_from_path(&p)?;
                Ok(Self::new(settings, p))
            }
            Some(p) => {
                info!("Settings file {} not found, starting empty", p.display());
                Ok(Self::new(Settings::default(), p))
            }
            None => {
                let p = default_settings_path();
                info!("No settings file found, will save to: {}", p.display());
                Ok(Self::new(Settings::default(), p))
            }
        }
    }

    /// Returns the path to the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_int(&self, key: &str) -> Option<i64> {
        self.settings.read().await.get_int(key)
    }

    /// Integer accessor with a default for absent keys, the common case for
    /// bindings and auto flags.
    pub async fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).await.unwrap_or(default)
    }

    pub async fn get_str(&self, key: &str) -> Option<String> {
        self.settings.read().await.get_str(key).map(str::to_string)
    }

    pub async fn set_int(&self, key: &str, value: i64) {
        self.settings.write().await.set_int(key, value);
    }

    pub async fn set_str(&self, key: &str, value: &str) {
        self.settings.write().await.set_str(key, value);
    }

    /// Reloads the store from disk, replacing the in-memory map.
    pub async fn reload(&self) -> Result<()> {
        info!("Reloading settings from: {}", self.path.display());
        let new_settings = Self::read_from_path(&self.path)?;
        *self.settings.write().await = new_settings;
        Ok(())
    }

    /// Persists the store atomically (write to a temp file, then rename).
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.settings.read().await.clone();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(&snapshot).context("Failed to serialize settings")?;

        let tmp_path = self.path.with_extension("yml.tmp");
        fs::write(&tmp_path, yaml)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to move settings to {}", self.path.display()))?;

        Ok(())
    }

    fn read_from_path(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_settings(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[tokio::test]
    async fn load_valid_yaml() {
        let temp_file = create_temp_settings(
            "performance_mode: 1\ncharge_limit: 80\nm3_custom: \"playerctl play-pause\"\n",
        );

        let manager = SettingsManager::load(Some(temp_file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(manager.get_int("performance_mode").await, Some(1));
        assert_eq!(manager.get_int("charge_limit").await, Some(80));
        assert_eq!(
            manager.get_str("m3_custom").await,
            Some("playerctl play-pause".to_string())
        );
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn env_var_overrides_standard_locations() {
        let temp_file = create_temp_settings("charge_limit: 60\n");
        // Process-global state; serialized against other env-touching tests.
        unsafe {
            env::set_var("ARMOURYD_CONFIG", temp_file.path());
        }

        let manager = SettingsManager::load(None).await.unwrap();

        unsafe {
            env::remove_var("ARMOURYD_CONFIG");
        }
        assert_eq!(manager.get_int("charge_limit").await, Some(60));
        assert_eq!(manager.path(), temp_file.path());
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");

        let manager = SettingsManager::load(Some(path)).await.unwrap();

        assert_eq!(manager.get_int("performance_mode").await, None);
        assert_eq!(manager.get_int_or("m3", 0).await, 0);
    }

    #[tokio::test]
    async fn typed_accessors_do_not_cross_types() {
        let temp_file = create_temp_settings("m3: 3\nm3_custom: \"notify-send hi\"\n");

        let manager = SettingsManager::load(Some(temp_file.path().to_path_buf()))
            .await
            .unwrap();

        // An int key read as string (and vice versa) yields None.
        assert_eq!(manager.get_str("m3").await, None);
        assert_eq!(manager.get_int("m3_custom").await, None);
    }

    #[tokio::test]
    async fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("armouryd/settings.yml");

        let manager = SettingsManager::load(Some(path.clone())).await.unwrap();
        manager.set_int("aura_mode", 2).await;
        manager.set_str("m4_custom", "true").await;
        manager.save().await.unwrap();

        let reloaded = SettingsManager::load(Some(path)).await.unwrap();
        assert_eq!(reloaded.get_int("aura_mode").await, Some(2));
        assert_eq!(reloaded.get_str("m4_custom").await, Some("true".to_string()));
    }

    #[tokio::test]
    async fn reload_picks_up_external_edit() {
        let temp_file = create_temp_settings("gpu_auto: 0\n");
        let manager = SettingsManager::load(Some(temp_file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(manager.get_int("gpu_auto").await, Some(0));

        std::fs::write(temp_file.path(), "gpu_auto: 1\ngpu_battery: 0\n").unwrap();
        manager.reload().await.unwrap();

        assert_eq!(manager.get_int("gpu_auto").await, Some(1));
        assert_eq!(manager.get_int("gpu_battery").await, Some(0));
    }
}
