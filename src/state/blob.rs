// state/blob.rs
// Durable key/value blob storage. One blob per collection, rewritten wholesale.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

pub trait BlobStore: Send {
    /// Returns `Ok(None)` when the blob has never been written.
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, contents: &str) -> Result<()>;
}

/// Stores each blob as `<dir>/<key>.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Some(raw))
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
    }
}

/// Process-local store, used by tests and throwaway runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, key: &str, contents: &str) -> Self {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), contents.to_string());
        }
        self
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory blob store poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory blob store poisoned"))?;
        blobs.insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

impl<T: BlobStore + Sync + ?Sized> BlobStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        (**self).save(key, contents)
    }
}
