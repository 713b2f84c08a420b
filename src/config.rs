use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, sync::RwLock};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

const API_URL_ENV: &str = "FOCUSDECK_API_URL";
const API_TIMEOUT_ENV: &str = "FOCUSDECK_API_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Reads `FOCUSDECK_API_URL` and `FOCUSDECK_API_TIMEOUT_SECS`, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let base_url =
            env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let timeout_secs = env::var(API_TIMEOUT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        Self {
            base_url,
            timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClientSettings {
    api: ApiConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
        }
    }
}

/// JSON-file-backed settings, written through on every update. Unreadable
/// or missing files fall back to defaults rather than failing the host.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ClientSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ClientSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn api(&self) -> ApiConfig {
        self.data.read().unwrap().api.clone()
    }

    pub fn update_api(&self, config: ApiConfig) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.api = config;
            self.persist(&guard)?;
        }
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: ClientSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &ClientSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
