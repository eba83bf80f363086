use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared_api_client::BackendClient;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::triage::{TriageEvent, TriageMetadata, TriageRequest};

use crate::models::{StreamSummary, TRIAGE_PATH};
use crate::services::decoder::LineDecoder;

/// Source of triage events for a chat session.
#[async_trait]
pub trait TriageTransport: Send + Sync {
    /// Streams the backend's answer to `request`, invoking `on_event` for
    /// each record in arrival order. Returns once the stream ends, fails,
    /// or `cancel` fires.
    async fn stream_triage(
        &self,
        request: &TriageRequest,
        cancel: &CancellationToken,
        on_event: &mut (dyn FnMut(TriageEvent) + Send),
    ) -> Result<StreamSummary, AppError>;
}

pub struct TriageStreamClient {
    backend: BackendClient,
    idle_timeout: Duration,
}

impl TriageStreamClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendClient::new(config)?,
            idle_timeout: config.triage_idle_timeout,
        })
    }

    pub fn with_backend(backend: BackendClient, idle_timeout: Duration) -> Self {
        Self {
            backend,
            idle_timeout,
        }
    }

    pub async fn stream<F>(
        &self,
        request: &TriageRequest,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<StreamSummary, AppError>
    where
        F: FnMut(TriageEvent) + Send,
    {
        info!("Sending triage request ({} chars)", request.message.len());

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            opened = timeout(self.idle_timeout, self.backend.post_stream(TRIAGE_PATH, request)) => {
                opened.map_err(|_| AppError::Timeout(self.idle_timeout))??
            }
        };

        let mut body = response.bytes_stream();
        let mut decoder = LineDecoder::new();
        let mut summary = StreamSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Triage stream cancelled after {} events", summary.events);
                    return Err(AppError::Cancelled);
                }
                next = timeout(self.idle_timeout, body.next()) => {
                    next.map_err(|_| AppError::Timeout(self.idle_timeout))?
                }
            };

            let Some(chunk) = next else { break };
            let bytes = chunk.map_err(|e| AppError::Transport(e.to_string()))?;

            for line in decoder.feed(&bytes) {
                if cancel.is_cancelled() {
                    return Err(AppError::Cancelled);
                }
                dispatch(&line, &mut summary, &mut on_event);
            }
        }

        if let Some(line) = decoder.finish() {
            dispatch(&line, &mut summary, &mut on_event);
        }

        info!(
            "Triage stream finished: {} events, {} dropped lines",
            summary.events, summary.dropped_lines
        );
        Ok(summary)
    }

    /// Reads the whole stream and returns only the classification.
    pub async fn triage_once(&self, request: &TriageRequest) -> Result<TriageMetadata, AppError> {
        let mut metadata = None;
        self.stream(request, &CancellationToken::new(), |event| {
            if let TriageEvent::Metadata(m) = event {
                metadata.get_or_insert(m);
            }
        })
        .await?;

        metadata.ok_or_else(|| AppError::Protocol("Triage stream carried no metadata".to_string()))
    }
}

fn dispatch<F>(line: &str, summary: &mut StreamSummary, on_event: &mut F)
where
    F: FnMut(TriageEvent),
{
    match TriageEvent::from_line(line) {
        Ok(event) => {
            summary.events += 1;
            on_event(event);
        }
        Err(err) => {
            summary.dropped_lines += 1;
            warn!("Dropping malformed stream line: {}", err);
        }
    }
}

#[async_trait]
impl TriageTransport for TriageStreamClient {
    async fn stream_triage(
        &self,
        request: &TriageRequest,
        cancel: &CancellationToken,
        on_event: &mut (dyn FnMut(TriageEvent) + Send),
    ) -> Result<StreamSummary, AppError> {
        self.stream(request, cancel, |event| on_event(event)).await
    }
}
