use crate::error::StorageError;
use async_trait::async_trait;
use std::fmt;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Name of a stored artifact. Plain file names only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    pub const LATEST_IMAGE: &'static str = "generated_image.png";

    pub fn new(name: impl Into<String>) -> StorageResult<Self> {
        let name = name.into();
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if is_plain {
            Ok(Self(name))
        } else {
            Err(StorageError::InvalidKey(name))
        }
    }

    /// The single slot holding the most recent generation.
    pub fn latest() -> Self {
        Self(Self::LATEST_IMAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Replaces whatever is stored under `key`.
    async fn save(&self, key: &ArtifactKey, bytes: &[u8]) -> StorageResult<()>;

    async fn load(&self, key: &ArtifactKey) -> StorageResult<Vec<u8>>;

    async fn exists(&self, key: &ArtifactKey) -> StorageResult<bool>;
}
