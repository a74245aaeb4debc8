//! Profile Storage
//!
//! Durable home of the profile collection. The whole collection is
//! rewritten after every mutation, so implementations only need load/save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, SignalError};
use crate::model::Profile;

/// Profile storage trait
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read every stored profile, in stored order. Empty if nothing saved yet.
    async fn load(&self) -> Result<Vec<Profile>>;

    /// Replace the stored collection
    async fn save(&self, profiles: &[Profile]) -> Result<()>;
}

/// In-memory profile store
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// What a fresh `load` would return
    pub async fn stored(&self) -> Vec<Profile> {
        self.profiles.read().await.clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.read().await.clone())
    }

    async fn save(&self, profiles: &[Profile]) -> Result<()> {
        *self.profiles.write().await = profiles.to_vec();
        Ok(())
    }
}

/// JSON file store.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so the file on disk is always a complete collection.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "profiles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Profile>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No profile file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            SignalError::Store(format!("{} is not a profile list: {}", self.path.display(), e))
        })
    }

    async fn save(&self, profiles: &[Profile]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(profiles)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("Saved {} profile(s) to {}", profiles.len(), self.path.display());
        Ok(())
    }
}
