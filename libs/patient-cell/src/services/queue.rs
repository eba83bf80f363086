use tracing::debug;

use shared_api_client::BackendClient;
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{QueueEntry, QueueSnapshot, QUEUE_PATH};

pub struct QueueService {
    backend: BackendClient,
}

impl QueueService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendClient::new(config)?,
        })
    }

    pub fn with_backend(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub async fn fetch_queue(&self) -> Result<Vec<QueueEntry>, AppError> {
        let entries: Vec<QueueEntry> = self.backend.get(QUEUE_PATH).await?;
        debug!("Fetched {} queue entries", entries.len());
        Ok(entries)
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot, AppError> {
        Ok(QueueSnapshot::new(self.fetch_queue().await?))
    }
}
