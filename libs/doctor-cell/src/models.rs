use serde::{Deserialize, Serialize};

pub use shared_models::doctor::Doctor;

pub const RECOMMEND_PATH: &str = "/recommend";

/// Body of `POST /recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub symptoms: String,
}

impl RecommendRequest {
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self {
            symptoms: symptoms.into(),
        }
    }

    /// Joins classified symptoms into the free-text form the endpoint takes.
    pub fn from_symptoms<S: AsRef<str>>(symptoms: &[S]) -> Self {
        let joined = symptoms
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(joined)
    }

    pub fn is_blank(&self) -> bool {
        self.symptoms.trim().is_empty()
    }
}
