pub mod local;
pub mod traits;

use crate::{config::StorageConfig, error::Result};
use local::LocalArtifactStorage;
use std::sync::Arc;
use traits::{ArtifactStorage, StorageResult};

pub use traits::ArtifactKey;

/// Front door to artifact persistence. Holds the most recent image under
/// [`ArtifactKey::latest`] unless a caller asks for another key.
#[derive(Clone)]
pub struct ArtifactStore {
    backend: Arc<dyn ArtifactStorage>,
}

impl ArtifactStore {
    /// Local-disk store rooted at the configured images directory. Creates the
    /// directory if missing.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.images_dir)
            .await
            .map_err(crate::error::StorageError::from)?;
        log::info!("Artifact store ready at {}", config.images_dir.display());
        Ok(Self::with_backend(Arc::new(LocalArtifactStorage::new(
            config.images_dir.clone(),
        ))))
    }

    pub fn with_backend(backend: Arc<dyn ArtifactStorage>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, key: &ArtifactKey, bytes: &[u8]) -> StorageResult<()> {
        self.backend.save(key, bytes).await
    }

    pub async fn load(&self, key: &ArtifactKey) -> StorageResult<Vec<u8>> {
        self.backend.load(key).await
    }

    pub async fn save_latest(&self, bytes: &[u8]) -> StorageResult<()> {
        self.save(&ArtifactKey::latest(), bytes).await
    }

    pub async fn load_latest(&self) -> StorageResult<Vec<u8>> {
        self.load(&ArtifactKey::latest()).await
    }

    pub async fn exists_latest(&self) -> StorageResult<bool> {
        self.backend.exists(&ArtifactKey::latest()).await
    }
}
