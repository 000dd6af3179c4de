//! Observability sink for dispatch attempts
//!
//! Every provider attempt (success or failure) is reported as one tuple to
//! an injected sink. The default sink logs through `tracing`; embedders can
//! swap in a metrics pipeline without touching the dispatcher.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderId;

/// Outcome of a single provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Success,
    HttpStatus(u16),
    Timeout,
    TransportError,
    MalformedResponse,
}

/// One dispatch attempt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAttempt {
    pub agent: String,
    pub provider: ProviderId,
    pub status: AttemptStatus,
    pub latency_ms: u64,
    pub input_bytes: usize,
}

/// Sink accepting per-attempt observability records.
pub trait DispatchSink: Send + Sync {
    fn record(&self, attempt: &DispatchAttempt);
}

/// Default sink: structured tracing events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DispatchSink for TracingSink {
    fn record(&self, attempt: &DispatchAttempt) {
        match attempt.status {
            AttemptStatus::Success => tracing::info!(
                agent = %attempt.agent,
                provider = ?attempt.provider,
                latency_ms = attempt.latency_ms,
                input_bytes = attempt.input_bytes,
                "Dispatch attempt succeeded"
            ),
            status => tracing::warn!(
                agent = %attempt.agent,
                provider = ?attempt.provider,
                status = ?status,
                latency_ms = attempt.latency_ms,
                input_bytes = attempt.input_bytes,
                "Dispatch attempt failed"
            ),
        }
    }
}
