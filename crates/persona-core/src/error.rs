//! Typed failure taxonomy for the provider dispatch layer

use thiserror::Error;

use crate::llm::ProviderId;

/// Fixed user-facing message for terminal dispatch failures. The detailed
/// error stays internal (logged via the dispatch sink and `tracing`).
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The assistant is temporarily unavailable. Please try again in a moment.";

/// Errors surfaced by the dispatcher to its callers.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No credential configured for the provider — skipped, never fatal on
    /// its own.
    #[error("provider {0:?} is not configured")]
    Unconfigured(ProviderId),

    /// The per-attempt transport timeout elapsed.
    #[error("request to {0:?} timed out")]
    Timeout(ProviderId),

    /// HTTP 429 from the provider.
    #[error("rate limited by {0:?}")]
    RateLimited(ProviderId),

    /// HTTP 401/403 from the provider.
    #[error("authentication with {0:?} failed")]
    AuthenticationFailed(ProviderId),

    /// Any other non-2xx status.
    #[error("provider {provider:?} returned {status}: {message}")]
    ProviderError {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    /// Response body could not be parsed into the expected shape.
    #[error("malformed response from {0:?}")]
    MalformedResponse(ProviderId),

    /// Every candidate was skipped or failed. Terminal for this call.
    #[error("no provider available")]
    NoProviderAvailable,
}

impl DispatchError {
    /// Whether this failure is worth retrying against the same provider.
    /// Timeouts, 429s, and 5xx responses are transient; everything else
    /// advances to the next candidate immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            DispatchError::Timeout(_) | DispatchError::RateLimited(_) => true,
            DispatchError::ProviderError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Safe generic message for end users. Never exposes provider detail.
    pub fn user_message(&self) -> &'static str {
        SERVICE_UNAVAILABLE_MESSAGE
    }
}
