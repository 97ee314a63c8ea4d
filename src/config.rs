use crate::error::{RelayError, Result};
use actix_web::http::header::HeaderValue;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub cors_allow_origin: String,
    pub max_body_bytes: usize,
}

#[derive(Clone)]
pub struct InferenceConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub max_attempts: u32,
    pub base_wait: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub images_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: PathBuf::from("build"),
            cors_allow_origin: "*".to_string(),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        ServerConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").unwrap_or(defaults.cors_allow_origin),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_allow_origin = origin.into();
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            api_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            max_attempts: 3,
            base_wait: Duration::from_secs(2),
            timeout: Duration::from_secs(90),
        }
    }
}

// The token never reaches logs or panic messages.
impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .field("base_wait", &self.base_wait)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl InferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        InferenceConfig {
            api_url: env::var("INFERENCE_API_URL").unwrap_or(defaults.api_url),
            api_token: env::var("HF_API_TOKEN").ok().filter(|token| !token.is_empty()),
            max_attempts: env_parse("INFERENCE_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            base_wait: env_parse("INFERENCE_BASE_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.base_wait),
            timeout: env_parse("INFERENCE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_retries(mut self, max_attempts: u32, base_wait: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_wait = base_wait;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            images_dir: PathBuf::from("images"),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        StorageConfig {
            images_dir: env::var("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default().images_dir),
        }
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = dir.into();
        self
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            server: ServerConfig::from_env(),
            inference: InferenceConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }

    pub fn with_server(mut self, config: ServerConfig) -> Self {
        self.server = config;
        self
    }

    pub fn with_inference(mut self, config: InferenceConfig) -> Self {
        self.inference = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.inference.api_url.trim().is_empty() {
            return Err(RelayError::ConfigError(
                "Inference API URL must not be empty".into(),
            ));
        }
        if self.inference.api_token.is_none() {
            return Err(RelayError::ConfigError(
                "HF_API_TOKEN is required to call the inference provider".into(),
            ));
        }
        if self.inference.max_attempts == 0 {
            return Err(RelayError::ConfigError(
                "INFERENCE_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(RelayError::ConfigError(
                "MAX_BODY_BYTES must be at least 1".into(),
            ));
        }
        if HeaderValue::from_str(&self.server.cors_allow_origin).is_err() {
            return Err(RelayError::ConfigError(format!(
                "Invalid CORS origin: {}",
                self.server.cors_allow_origin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config::new().with_inference(InferenceConfig::new().with_api_token("hf_test"))
    }

    #[test]
    fn defaults_match_the_provider_contract() {
        let config = InferenceConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_wait, Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert!(config.api_token.is_none());
        assert_eq!(StorageConfig::default().images_dir, PathBuf::from("images"));
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = Config::new().validate().unwrap_err();
        assert!(matches!(err, RelayError::ConfigError(msg) if msg.contains("HF_API_TOKEN")));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let config = valid().with_inference(
            InferenceConfig::new()
                .with_api_token("hf_test")
                .with_retries(0, Duration::from_secs(1)),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_cors_origin_is_rejected() {
        let config = valid().with_server(ServerConfig::new().with_cors_origin("bad\norigin"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn body_limit_defaults_above_actix_and_rejects_zero() {
        assert_eq!(ServerConfig::default().max_body_bytes, 16 * 1024 * 1024);
        let config = valid().with_server(ServerConfig::new().with_max_body_bytes(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = InferenceConfig::new().with_api_token("hf_secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hf_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
