//! Advisory oracle integration.
//!
//! Defines the `AdvisoryClient` trait over chat-completion providers
//! and the validator that turns a ranked shortlist into an
//! approve/reject verdict, with throttle handling and model fallback.

pub mod openrouter;
pub mod validator;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use validator::{Validator, ValidatorConfig};

/// Errors a completion call can surface. `Throttled` is the only
/// variant the validator treats as recoverable.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// The provider returned 429. `retry_after` carries the server's
    /// hint when one was sent.
    #[error("advisory provider rate limited (retry-after: {retry_after:?})")]
    Throttled { retry_after: Option<Duration> },

    /// Any other non-success HTTP status.
    #[error("advisory provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("advisory transport error: {0}")]
    Transport(String),
}

/// Abstraction over chat-completion providers.
///
/// Implementors send one system+user exchange to the named model and
/// return the assistant's raw text. Retry and fallback policy live in
/// the validator, not here.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, AdvisorError>;
}
