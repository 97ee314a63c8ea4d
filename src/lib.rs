//! HTTP relay in front of a hosted text-to-image inference endpoint.
//!
//! `POST /generate` forwards a prompt to the provider with bounded retries,
//! the resulting image is kept on local disk, and `GET /generated_image.png`
//! serves it back.

pub mod config;
pub mod error;
pub mod inference;
pub mod logger;
pub mod models;
pub mod server;
pub mod storage;

pub use config::{Config, InferenceConfig, ServerConfig, StorageConfig};
pub use error::{GenerationError, RelayError, RequestError, Result, StorageError};
pub use inference::{InferenceClient, RetryPolicy};
pub use models::{ImageGenerationRequest, Quality, QualityProfile};
pub use storage::{ArtifactKey, ArtifactStore};
