use crate::{
    error::StorageError,
    storage::traits::{ArtifactKey, ArtifactStorage, StorageResult},
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Artifacts as files directly under one directory.
pub struct LocalArtifactStorage {
    root: PathBuf,
}

impl LocalArtifactStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.as_str())
    }
}

#[async_trait]
impl ArtifactStorage for LocalArtifactStorage {
    async fn save(&self, key: &ArtifactKey, bytes: &[u8]) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        fs::write(&path, bytes).await?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn load(&self, key: &ArtifactKey) -> StorageResult<Vec<u8>> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &ArtifactKey) -> StorageResult<bool> {
        Ok(fs::try_exists(self.path_for(key)).await?)
    }
}
