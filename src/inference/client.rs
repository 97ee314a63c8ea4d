use crate::{
    config::InferenceConfig,
    error::{GenerationError, Result},
    inference::{
        delay::{Delay, TokioDelay},
        transport::{HttpTransport, InferenceTransport, RawResponse, TransportFailure},
    },
    models::{InferencePayload, QualityProfile},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const ERROR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_wait: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_wait: config.base_wait,
        }
    }

    /// Linear backoff: `base_wait * (attempt_index + 1)`. Saturates at
    /// `Duration::MAX` instead of overflowing.
    pub fn wait_for(&self, attempt_index: u32) -> Duration {
        self.base_wait
            .checked_mul(attempt_index.saturating_add(1))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&InferenceConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    ModelLoading,
    Timeout,
    Transport(String),
}

impl RetryReason {
    fn exhausted(self, attempts: u32) -> GenerationError {
        match self {
            RetryReason::ModelLoading => GenerationError::ModelLoading { attempts },
            RetryReason::Timeout => GenerationError::Timeout { attempts },
            RetryReason::Transport(message) => GenerationError::Transport { attempts, message },
        }
    }
}

impl From<TransportFailure> for RetryReason {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Timeout => RetryReason::Timeout,
            TransportFailure::Other(message) => RetryReason::Transport(message),
        }
    }
}

/// Classified result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Vec<u8>),
    Retryable { reason: RetryReason, wait: Duration },
    Fatal { reason: String, status: u16 },
}

impl AttemptOutcome {
    pub fn classify(response: RawResponse, wait: Duration) -> Self {
        match response.status {
            200 => AttemptOutcome::Success(response.body),
            503 => AttemptOutcome::Retryable {
                reason: RetryReason::ModelLoading,
                wait,
            },
            status => AttemptOutcome::Fatal {
                reason: error_message(&response.body),
                status,
            },
        }
    }
}

/// Pulls `error` out of a JSON object body, else an excerpt of the raw body.
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => match fields.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        },
        _ => String::from_utf8_lossy(body)
            .chars()
            .take(ERROR_EXCERPT_CHARS)
            .collect(),
    }
}

/// Client for the hosted image-generation endpoint.
#[derive(Clone)]
pub struct InferenceClient {
    transport: Arc<dyn InferenceTransport>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        Ok(Self::with_transport(
            Arc::new(HttpTransport::new(config)?),
            Arc::new(TokioDelay),
            RetryPolicy::from_config(config),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn InferenceTransport>,
        delay: Arc<dyn Delay>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            delay,
            policy,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        profile: &QualityProfile,
    ) -> std::result::Result<Vec<u8>, GenerationError> {
        let payload = InferencePayload::new(prompt, profile);
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            log::info!(
                "Sending inference request (attempt {}/{}, {} steps, {}x{})",
                attempt + 1,
                max_attempts,
                profile.num_inference_steps,
                profile.width,
                profile.height
            );

            let wait = self.policy.wait_for(attempt);
            let outcome = match self.transport.post(&payload).await {
                Ok(response) => AttemptOutcome::classify(response, wait),
                Err(failure) => AttemptOutcome::Retryable {
                    reason: failure.into(),
                    wait,
                },
            };

            match outcome {
                AttemptOutcome::Success(bytes) => {
                    log::info!("Inference succeeded with {} bytes", bytes.len());
                    return Ok(bytes);
                }
                AttemptOutcome::Fatal { reason, status } => {
                    log::error!("Inference failed with status {}: {}", status, reason);
                    return Err(GenerationError::Upstream {
                        status,
                        message: reason,
                    });
                }
                AttemptOutcome::Retryable { reason, wait } => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        let err = reason.exhausted(max_attempts);
                        log::error!("Inference gave up after {} attempts: {}", attempt, err);
                        return Err(err);
                    }
                    log::warn!(
                        "Transient inference failure ({:?}), waiting {:.1}s before retrying",
                        reason,
                        wait.as_secs_f64()
                    );
                    self.delay.wait(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = std::result::Result<RawResponse, TransportFailure>;

    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<u32>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl InferenceTransport for ScriptedTransport {
        async fn post(&self, _payload: &InferencePayload) -> Scripted {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    fn status(code: u16, body: &str) -> Scripted {
        Ok(RawResponse {
            status: code,
            body: body.as_bytes().to_vec(),
        })
    }

    fn client(transport: Arc<ScriptedTransport>, delay: Arc<RecordingDelay>) -> InferenceClient {
        InferenceClient::with_transport(transport, delay, RetryPolicy::default())
    }

    #[test]
    fn backoff_is_linear_and_increasing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.wait_for(0), Duration::from_secs(2));
        assert_eq!(policy.wait_for(1), Duration::from_secs(4));
        assert_eq!(policy.wait_for(2), Duration::from_secs(6));
    }

    #[test]
    fn huge_base_wait_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_wait: Duration::from_secs(u64::MAX / 2 + 1),
        };
        assert_eq!(policy.wait_for(0), Duration::from_secs(u64::MAX / 2 + 1));
        assert_eq!(policy.wait_for(1), Duration::MAX);
        assert_eq!(policy.wait_for(u32::MAX), Duration::MAX);
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(error_message(br#"{"error":"bad input"}"#), "bad input");
        assert_eq!(error_message(br#"{"error":["a","b"]}"#), r#"["a","b"]"#);
        assert_eq!(error_message(br#"{"detail":"x"}"#), "Unknown error");
    }

    #[test]
    fn error_message_truncates_raw_bodies() {
        let body = "x".repeat(500);
        assert_eq!(error_message(body.as_bytes()).len(), 200);
        assert_eq!(error_message(b"[1,2]"), "[1,2]");
        assert_eq!(error_message(b"Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn two_loading_answers_then_success() {
        let transport = ScriptedTransport::new(vec![
            status(503, "loading"),
            status(503, "loading"),
            status(200, "PNGDATA"),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let bytes = client(transport.clone(), delay.clone())
            .generate("a fox", &QualityProfile::STANDARD)
            .await
            .unwrap();

        assert_eq!(bytes, b"PNGDATA".to_vec());
        assert_eq!(transport.calls(), 3);
        assert_eq!(
            *delay.waits.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn three_loading_answers_exhaust_the_budget() {
        let transport = ScriptedTransport::new(vec![
            status(503, "loading"),
            status(503, "loading"),
            status(503, "loading"),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let err = client(transport.clone(), delay.clone())
            .generate("a fox", &QualityProfile::STANDARD)
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::ModelLoading { attempts: 3 });
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(transport.calls(), 3);
        assert_eq!(delay.waits.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![status(400, r#"{"error":"Invalid prompt"}"#)]);
        let delay = Arc::new(RecordingDelay::default());
        let err = client(transport.clone(), delay.clone())
            .generate("a fox", &QualityProfile::HIGH)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::Upstream {
                status: 400,
                message: "Invalid prompt".into()
            }
        );
        assert!(!err.is_retryable());
        assert_eq!(transport.calls(), 1);
        assert!(delay.waits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeouts_retry_then_fail() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportFailure::Timeout),
            Err(TransportFailure::Timeout),
            Err(TransportFailure::Timeout),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let err = client(transport.clone(), delay.clone())
            .generate("a fox", &QualityProfile::STANDARD)
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::Timeout { attempts: 3 });
        assert_eq!(err.status_code(), None);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn transport_fault_recovers_on_retry() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportFailure::Other("connection reset".into())),
            status(200, "IMG"),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let bytes = client(transport.clone(), delay.clone())
            .generate("a fox", &QualityProfile::STANDARD)
            .await
            .unwrap();

        assert_eq!(bytes, b"IMG".to_vec());
        assert_eq!(*delay.waits.lock().unwrap(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn exhausted_transport_fault_embeds_cause() {
        let transport = ScriptedTransport::new(vec![
            status(503, "loading"),
            Err(TransportFailure::Other("dns failure".into())),
            Err(TransportFailure::Other("connection refused".into())),
        ]);
        let delay = Arc::new(RecordingDelay::default());
        let err = client(transport, delay)
            .generate("a fox", &QualityProfile::STANDARD)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed after 3 attempts: connection refused");
        assert!(!err.is_retryable());
    }
}
