use thiserror::Error;

/// Crate-level failures: configuration, startup and server lifecycle.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Client error: {0}")]
    ClientError(String),
    #[error("Logger error: {0}")]
    LoggerError(String),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Server error: {0}")]
    ServerError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Rejections of an incoming generate request. Always answered with 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("No data provided")]
    NoData,
    #[error("No prompt provided")]
    NoPrompt,
}

/// Final outcome of a failed call to the inference provider, after retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The provider kept answering 503 until the attempt budget ran out.
    #[error("Model is loading, please try again in a few seconds")]
    ModelLoading { attempts: u32 },
    /// Any other non-200 answer. Never retried.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Request timed out. The model is taking too long to respond.")]
    Timeout { attempts: u32 },
    #[error("Failed after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },
}

impl GenerationError {
    /// HTTP status to relay to the caller, if the provider gave one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GenerationError::ModelLoading { .. } => Some(503),
            GenerationError::Upstream { status, .. } => Some(*status),
            GenerationError::Timeout { .. } | GenerationError::Transport { .. } => None,
        }
    }

    /// Whether resubmitting the same request is likely to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::ModelLoading { .. })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
