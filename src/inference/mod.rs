pub mod client;
pub mod delay;
pub mod transport;

pub use client::{AttemptOutcome, InferenceClient, RetryPolicy, RetryReason};
pub use delay::{Delay, TokioDelay};
pub use transport::{HttpTransport, InferenceTransport, RawResponse, TransportFailure};
