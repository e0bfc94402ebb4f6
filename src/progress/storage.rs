//! Durable progress persistence
//!
//! One record per progress id in shared storage. The file implementation
//! writes one JSON file per id under a shared directory, which is what lets
//! a second process on the same machine observe progress written by the
//! first. A multi-node deployment would reimplement this trait over a
//! shared key-value store.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use super::store::ProgressEntry;

#[async_trait]
pub trait ProgressStorage: Send + Sync {
    async fn save(&self, entry: &ProgressEntry) -> Result<()>;
    async fn load(&self, id: &str) -> Result<Option<ProgressEntry>>;
    async fn remove(&self, id: &str) -> Result<()>;
}

pub struct FileProgressStorage {
    dir: PathBuf,
}

impl FileProgressStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        // Ids are uuids; no separators to sanitize
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl ProgressStorage for FileProgressStorage {
    async fn save(&self, entry: &ProgressEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename keeps a concurrent reader from seeing a
        // half-written record.
        let path = self.entry_path(&entry.id);
        let tmp = self.dir.join(format!("{}.json.tmp", entry.id));
        let payload = serde_json::to_vec(entry)?;
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<ProgressEntry>> {
        match tokio::fs::read(self.entry_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.entry_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
