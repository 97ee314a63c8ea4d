use serde::{Deserialize, Serialize};

/// `{success, message}` returned once an image has been generated and saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationAck {
    pub success: bool,
    pub message: String,
}

impl GenerationAck {
    pub fn generated() -> Self {
        Self {
            success: true,
            message: "Image generated successfully".to_string(),
        }
    }
}

/// `{error}` body, with the `retry` hint only on generate failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<bool>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry: None,
        }
    }

    pub fn with_retry(error: impl Into<String>, retry: bool) -> Self {
        Self {
            error: error.into(),
            retry: Some(retry),
        }
    }
}
