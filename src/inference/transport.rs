use crate::{
    config::InferenceConfig,
    error::{RelayError, Result},
    models::InferencePayload,
};
use async_trait::async_trait;
use reqwest::Client;

/// Status and fully-read body of one provider answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A call that produced no HTTP answer at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Other(String),
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportFailure::Timeout
        } else {
            TransportFailure::Other(err.to_string())
        }
    }
}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn post(
        &self,
        payload: &InferencePayload,
    ) -> std::result::Result<RawResponse, TransportFailure>;
}

/// reqwest-backed transport with bearer auth and a per-call timeout.
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpTransport {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| {
            RelayError::ConfigError("HF_API_TOKEN is required to call the inference provider".into())
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_token,
        })
    }
}

#[async_trait]
impl InferenceTransport for HttpTransport {
    async fn post(
        &self,
        payload: &InferencePayload,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}
