use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use bytes::Bytes;
use uuid::Uuid;

use crate::config::AppConfig;

/// Disk-backed store for uploaded images. Files land in the public
/// directory and are served back under `/static/{filename}`.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let root = PathBuf::from(&config.public_dir);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|err| anyhow!("cannot create {}: {}", root.display(), err))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes under a fresh uuid filename, keeping the extension.
    pub async fn save(&self, data: &Bytes, extension: &str) -> Result<String> {
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(&filename);
        tokio::fs::write(&path, data)
            .await
            .map_err(|err| anyhow!("cannot write {}: {}", path.display(), err))?;
        Ok(filename)
    }
}
