//! Persistence port for the tracked mint list

use async_trait::async_trait;
use shared::{Error, Result, TrackedMint};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Key the tracked mint list is stored under
pub const SAVED_MINTS_KEY: &str = "savedMints";

/// String key-value store, the shape of a browser's local storage.
///
/// Values are opaque strings; the ledger client stores its mint list as a
/// JSON array under [`SAVED_MINTS_KEY`].
#[async_trait]
pub trait MintStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store for tests and ephemeral sessions
#[derive(Default)]
pub struct InMemoryMintStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryMintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw value under `key`
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl MintStore for InMemoryMintStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file on disk
pub struct JsonFileMintStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileMintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl MintStore for JsonFileMintStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.write().await;

        // A corrupt file is replaced rather than blocking every future save
        let mut entries = self.read_entries().await.unwrap_or_else(|e| {
            warn!("Discarding unreadable store file {}: {}", self.path.display(), e);
            HashMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        let serialized = serde_json::to_string_pretty(&entries)?;
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, serialized).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Persisted {} to {}", key, self.path.display());
        Ok(())
    }
}

/// Load the tracked list; an absent or malformed value yields an empty list.
pub async fn load_tracked_mints(store: &dyn MintStore) -> Vec<TrackedMint> {
    let raw = match store.get(SAVED_MINTS_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            error!("Error loading saved mints: {}", e);
            return Vec::new();
        }
    };

    let parsed: Vec<TrackedMint> = match serde_json::from_str(&raw) {
        Ok(mints) => mints,
        Err(e) => {
            error!("Error parsing saved mints, starting with none: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    parsed
        .into_iter()
        .filter(|mint| seen.insert(mint.address.clone()))
        .collect()
}

/// Persist the tracked list. Failures are logged, never surfaced.
pub async fn save_tracked_mints(store: &dyn MintStore, mints: &[TrackedMint]) {
    let serialized = match serde_json::to_string(mints) {
        Ok(s) => s,
        Err(e) => {
            error!("Error serializing mints: {}", Error::from(e));
            return;
        }
    };

    if let Err(e) = store.set(SAVED_MINTS_KEY, &serialized).await {
        error!("Error saving mints: {}", e);
    }
}
