//! Evidence image file store: save bytes under a name, nothing more.

use std::path::{Path, PathBuf};

use crate::Result;

/// Directory-backed store for evidence captures.
#[derive(Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    /// Create the store, ensuring its directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under `file_name` in the evidence directory and
    /// return the full path. The caller is responsible for picking a
    /// collision-free name.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}
