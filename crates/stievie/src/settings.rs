//! Persisted device identity and session credential.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StievieError;

/// Device and session state persisted across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub auth_hash: String,
    #[serde(default)]
    pub auth_hash_valid_until: i64,
}

/// Storage for [`Settings`], loaded at construction and saved after every
/// credential mutation.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, StievieError>;
    async fn save(&self, settings: &Settings) -> Result<(), StievieError>;
}

/// Settings persisted as a JSON document on disk.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<Settings, StievieError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, starting clean");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), StievieError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: parking_lot::Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: parking_lot::Mutex::new(settings),
        }
    }

    /// Current stored state, for assertions.
    pub fn snapshot(&self) -> Settings {
        self.settings.lock().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings, StievieError> {
        Ok(self.settings.lock().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StievieError> {
        *self.settings.lock() = settings.clone();
        Ok(())
    }
}
