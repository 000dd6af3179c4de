//! Provider selection, retry policy, and normalized completion dispatch
//!
//! The dispatcher walks the candidate chain from the registry (explicit
//! override first), retries transient failures against the same provider up
//! to a fixed attempt cap, and returns the first successful normalized
//! result. At most one successful call is ever made per request.

use async_trait::async_trait;
use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::error::DispatchError;
use crate::telemetry::{AttemptStatus, DispatchAttempt, DispatchSink, TracingSink};
use crate::types::{CompletionRequest, CompletionResult};

use super::{adapter_for, parse_stream_chunk, Capability, ProviderId, ProviderRegistry, TokenStream};

/// Attempts against one provider before abandoning it for this call.
pub const MAX_ATTEMPTS_PER_PROVIDER: u32 = 3;

/// Transport-level outcome before HTTP semantics apply.
#[derive(Debug)]
pub enum TransportFailure {
    Timeout,
    Connect(String),
}

/// A buffered HTTP response.
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// A streaming HTTP response. For non-2xx statuses the body preview is
/// populated and the chunk stream is empty.
pub struct TransportStream {
    pub status: u16,
    pub body_preview: String,
    pub chunks: Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>,
}

/// Network seam. The production implementation is reqwest-backed; tests
/// inject scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportFailure>;

    async fn execute_stream(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportStream, TransportFailure>;
}

/// reqwest-backed transport. The per-attempt timeout bounds the whole
/// buffered exchange; for streams it bounds connection establishment only —
/// chunk delivery is then paced by the provider.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn request(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        payload: &serde_json::Value,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).json(payload);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        builder
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportFailure> {
        let send = async {
            let response = self
                .request(url, headers, payload)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        TransportFailure::Timeout
                    } else {
                        TransportFailure::Connect(e.to_string())
                    }
                })?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportFailure::Connect(e.to_string()))?;
            Ok(TransportResponse { status, body })
        };
        match tokio::time::timeout(timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::Timeout),
        }
    }

    async fn execute_stream(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<TransportStream, TransportFailure> {
        let response = match tokio::time::timeout(
            timeout,
            self.request(url, headers, payload).send(),
        )
        .await
        {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                return Err(if e.is_timeout() {
                    TransportFailure::Timeout
                } else {
                    TransportFailure::Connect(e.to_string())
                });
            }
            Err(_) => return Err(TransportFailure::Timeout),
        };

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body_preview = response.text().await.unwrap_or_default();
            return Ok(TransportStream {
                status,
                body_preview,
                chunks: Box::pin(futures::stream::empty()),
            });
        }

        let chunks = response
            .bytes_stream()
            .map(|r| r.map(|b| b.to_vec()).map_err(|e| e.to_string()));
        Ok(TransportStream {
            status,
            body_preview: String::new(),
            chunks: Box::pin(chunks),
        })
    }
}

pub struct AiDispatcher {
    registry: ProviderRegistry,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn DispatchSink>,
}

impl AiDispatcher {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            transport: Arc::new(HttpTransport::new()),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn candidates(&self, request: &CompletionRequest) -> Vec<ProviderId> {
        match request.provider {
            Some(provider) => vec![provider],
            None => self.registry.resolve(&request.agent_id),
        }
    }

    /// Issue a completion, walking the candidate chain until one provider
    /// succeeds. Unconfigured providers are skipped without an attempt.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, DispatchError> {
        let candidates = self.candidates(request);
        if candidates.is_empty() {
            return Err(DispatchError::NoProviderAvailable);
        }

        for provider in candidates {
            if !self.registry.is_configured(provider) {
                tracing::debug!(provider = ?provider, "Skipping unconfigured provider");
                continue;
            }
            if !self.registry.supports(provider, Capability::Chat) {
                tracing::debug!(provider = ?provider, "Provider has no chat capability, skipping");
                continue;
            }
            match self.call_provider(provider, request).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        provider = ?provider,
                        error = %e,
                        "Provider abandoned, advancing to next candidate"
                    );
                }
            }
        }
        Err(DispatchError::NoProviderAvailable)
    }

    /// Issue a streaming completion. Chunks are delivered in network order;
    /// dropping the returned stream cancels delivery, and a half-delivered
    /// stream counts as partial success, not an error.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<TokenStream, DispatchError> {
        let candidates = self.candidates(request);
        if candidates.is_empty() {
            return Err(DispatchError::NoProviderAvailable);
        }

        let mut streaming_request = request.clone();
        streaming_request.options.stream = true;

        for provider in candidates {
            if !self.registry.is_configured(provider) {
                continue;
            }
            if !self.registry.supports(provider, Capability::Stream) {
                tracing::debug!(provider = ?provider, "Provider has no stream capability, skipping");
                continue;
            }
            match self.open_stream(provider, &streaming_request).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::warn!(provider = ?provider, error = %e, "Stream open failed");
                }
            }
        }
        Err(DispatchError::NoProviderAvailable)
    }

    /// Up to `MAX_ATTEMPTS_PER_PROVIDER` attempts against one provider.
    /// Only transient failures (timeout, 429, 5xx) are retried; anything
    /// else abandons the provider immediately.
    async fn call_provider(
        &self,
        provider: ProviderId,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, DispatchError> {
        let adapter = adapter_for(provider);
        let api_key = self
            .registry
            .api_key(provider)
            .ok_or(DispatchError::Unconfigured(provider))?
            .to_string();
        let model = self
            .registry
            .model_for(provider, request.options.model.as_deref());
        let url = adapter.endpoint(request, &model, &api_key);
        let headers = adapter.headers(&api_key);
        let payload = adapter.build_payload(request, &model);
        let timeout = self.registry.config().timeouts.for_kind(request.kind);

        let mut last_error = DispatchError::Unconfigured(provider);
        for attempt in 1..=MAX_ATTEMPTS_PER_PROVIDER {
            let started = Instant::now();
            let outcome = self
                .transport
                .execute(&url, &headers, &payload, timeout)
                .await;
            let latency_ms = started.elapsed().as_millis() as u64;

            let error = match outcome {
                Ok(response) if (200..300).contains(&response.status) => {
                    match adapter.parse_response(&response.body, &model) {
                        Ok(result) => {
                            self.record(request, provider, AttemptStatus::Success, latency_ms);
                            return Ok(result);
                        }
                        Err(e) => {
                            self.record(
                                request,
                                provider,
                                AttemptStatus::MalformedResponse,
                                latency_ms,
                            );
                            e
                        }
                    }
                }
                Ok(response) => {
                    self.record(
                        request,
                        provider,
                        AttemptStatus::HttpStatus(response.status),
                        latency_ms,
                    );
                    classify_status(provider, response.status, &response.body)
                }
                Err(TransportFailure::Timeout) => {
                    self.record(request, provider, AttemptStatus::Timeout, latency_ms);
                    DispatchError::Timeout(provider)
                }
                Err(TransportFailure::Connect(message)) => {
                    self.record(request, provider, AttemptStatus::TransportError, latency_ms);
                    // Status 0 marks a transport-level failure.
                    DispatchError::ProviderError {
                        provider,
                        status: 0,
                        message,
                    }
                }
            };

            if !error.is_transient() || attempt == MAX_ATTEMPTS_PER_PROVIDER {
                return Err(error);
            }
            tracing::debug!(
                provider = ?provider,
                attempt = attempt,
                error = %error,
                "Transient failure, retrying same provider"
            );
            last_error = error;
        }
        Err(last_error)
    }

    async fn open_stream(
        &self,
        provider: ProviderId,
        request: &CompletionRequest,
    ) -> Result<TokenStream, DispatchError> {
        let adapter = adapter_for(provider);
        let api_key = self
            .registry
            .api_key(provider)
            .ok_or(DispatchError::Unconfigured(provider))?
            .to_string();
        let model = self
            .registry
            .model_for(provider, request.options.model.as_deref());
        let url = adapter.endpoint(request, &model, &api_key);
        let headers = adapter.headers(&api_key);
        let payload = adapter.build_payload(request, &model);
        let timeout = self.registry.config().timeouts.for_kind(request.kind);

        let mut last_error = DispatchError::Unconfigured(provider);
        for attempt in 1..=MAX_ATTEMPTS_PER_PROVIDER {
            let started = Instant::now();
            let outcome = self
                .transport
                .execute_stream(&url, &headers, &payload, timeout)
                .await;
            let latency_ms = started.elapsed().as_millis() as u64;

            let error = match outcome {
                Ok(stream) if (200..300).contains(&stream.status) => {
                    self.record(request, provider, AttemptStatus::Success, latency_ms);
                    return Ok(forward_chunks(provider, stream.chunks));
                }
                Ok(stream) => {
                    self.record(
                        request,
                        provider,
                        AttemptStatus::HttpStatus(stream.status),
                        latency_ms,
                    );
                    classify_status(provider, stream.status, &stream.body_preview)
                }
                Err(TransportFailure::Timeout) => {
                    self.record(request, provider, AttemptStatus::Timeout, latency_ms);
                    DispatchError::Timeout(provider)
                }
                Err(TransportFailure::Connect(message)) => {
                    self.record(request, provider, AttemptStatus::TransportError, latency_ms);
                    DispatchError::ProviderError {
                        provider,
                        status: 0,
                        message,
                    }
                }
            };

            if !error.is_transient() || attempt == MAX_ATTEMPTS_PER_PROVIDER {
                return Err(error);
            }
            last_error = error;
        }
        Err(last_error)
    }

    fn record(
        &self,
        request: &CompletionRequest,
        provider: ProviderId,
        status: AttemptStatus,
        latency_ms: u64,
    ) {
        self.sink.record(&DispatchAttempt {
            agent: request.agent_id.clone(),
            provider,
            status,
            latency_ms,
            input_bytes: request.input_bytes(),
        });
    }
}

fn classify_status(provider: ProviderId, status: u16, body: &str) -> DispatchError {
    match status {
        401 | 403 => DispatchError::AuthenticationFailed(provider),
        429 => DispatchError::RateLimited(provider),
        _ => DispatchError::ProviderError {
            provider,
            status,
            message: body.chars().take(300).collect(),
        },
    }
}

/// Spawn the SSE forwarding task: raw bytes in, parsed deltas out.
/// Network chunks may split an SSE line anywhere, so the trailing partial
/// line is buffered until its newline arrives (or the connection closes).
/// Individual malformed lines are dropped silently; the stream ends at the
/// termination sentinel or when the connection closes.
fn forward_chunks(
    provider: ProviderId,
    mut chunks: Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>,
) -> TokenStream {
    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(async move {
        let mut pending = String::new();
        while let Some(chunk_result) = chunks.next().await {
            let bytes = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(provider = ?provider, error = %e, "Stream chunk error");
                    break;
                }
            };
            pending.push_str(&String::from_utf8_lossy(&bytes));
            let complete = match pending.rfind('\n') {
                Some(idx) => {
                    let rest = pending.split_off(idx + 1);
                    std::mem::replace(&mut pending, rest)
                }
                None => continue,
            };
            let (deltas, done) = parse_stream_chunk(provider, &complete);
            for delta in deltas {
                if tx.send(delta).await.is_err() {
                    // Caller dropped the stream — abort delivery.
                    return;
                }
            }
            if done {
                return;
            }
        }
        // Flush a final line the provider never newline-terminated.
        if !pending.is_empty() {
            let (deltas, _) = parse_stream_chunk(provider, &pending);
            for delta in deltas {
                if tx.send(delta).await.is_err() {
                    return;
                }
            }
        }
    });
    TokenStream::new(rx)
}
