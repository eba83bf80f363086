use tracing::{debug, error, info};

use shared_api_client::BackendClient;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::triage::TriageMetadata;

use crate::models::{Doctor, RecommendRequest, RECOMMEND_PATH};

pub struct RecommendationService {
    backend: BackendClient,
}

impl RecommendationService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            backend: BackendClient::new(config)?,
        })
    }

    pub fn with_backend(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Doctors matching the symptom text, in backend order.
    pub async fn recommend(&self, symptoms: &str) -> Result<Vec<Doctor>, AppError> {
        self.recommend_request(&RecommendRequest::new(symptoms.trim())).await
    }

    async fn recommend_request(&self, request: &RecommendRequest) -> Result<Vec<Doctor>, AppError> {
        if request.is_blank() {
            debug!("No symptoms given, skipping recommendation request");
            return Ok(Vec::new());
        }

        let doctors: Vec<Doctor> = self.backend.post(RECOMMEND_PATH, request).await?;
        info!("Received {} doctor recommendations", doctors.len());
        Ok(doctors)
    }

    /// Same as [`recommend`](Self::recommend) but degrades to an empty list.
    pub async fn recommend_or_empty(&self, symptoms: &str) -> Vec<Doctor> {
        match self.recommend(symptoms).await {
            Ok(doctors) => doctors,
            Err(err) => {
                error!("Error fetching recommendations: {}", err);
                Vec::new()
            }
        }
    }

    /// Uses the doctors embedded in a medical classification when present,
    /// otherwise asks the backend using its symptom list.
    pub async fn for_metadata(&self, metadata: &TriageMetadata) -> Result<Vec<Doctor>, AppError> {
        if !metadata.recommended_doctors.is_empty() {
            return Ok(metadata.recommended_doctors.clone());
        }
        if !metadata.is_medical() {
            return Ok(Vec::new());
        }

        self.recommend_request(&RecommendRequest::from_symptoms(&metadata.symptoms))
            .await
    }
}
