use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    api: ApiSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn api(&self) -> ApiSettings {
        self.data.read().unwrap().api.clone()
    }

    pub fn update_api(&self, settings: ApiSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.api = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_is_missing() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let store =
            SettingsStore::new(temp.path().join("settings.json")).expect("store should init");
        assert_eq!(store.api().base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn persists_updates_across_loads() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let path = temp.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).expect("store should init");
        store
            .update_api(ApiSettings {
                base_url: "http://10.0.0.2:5000".into(),
            })
            .expect("update should persist");

        let reloaded = SettingsStore::new(path).expect("store should reload");
        assert_eq!(reloaded.api().base_url, "http://10.0.0.2:5000");
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let path = temp.path().join("settings.json");
        fs::write(&path, "not json").expect("write should succeed");

        let store = SettingsStore::new(path).expect("store should init");
        assert_eq!(store.api().base_url, DEFAULT_API_BASE_URL);
    }
}
