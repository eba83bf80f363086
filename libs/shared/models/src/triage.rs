use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::doctor::Doctor;
use crate::error::AppError;
use crate::identifier::Identifier;

/// Body of `POST /triage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Identifier>,
}

impl TriageRequest {
    pub fn new(message: impl Into<String>, user_id: Option<Identifier>) -> Self {
        Self {
            message: message.into(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageMode {
    Medical,
    Chat,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn requires_alert(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(AppError::Protocol(format!("Unknown risk label: {}", other))),
        }
    }
}

/// Classification result attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriageMetadata {
    #[serde(default)]
    pub mode: TriageMode,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub doctor: Option<String>,
    #[serde(default)]
    pub advice: Option<String>,
    #[serde(default)]
    pub severity: Option<i64>,
    /// Classifier confidence as a percentage, sent as a string or a number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub confidence: Option<String>,
    #[serde(default)]
    pub recommended_doctors: Vec<Doctor>,
}

impl TriageMetadata {
    pub fn is_medical(&self) -> bool {
        self.mode == TriageMode::Medical
    }

    /// Risk label lower-cased, if the backend sent a non-blank one.
    pub fn normalized_risk(&self) -> Option<String> {
        self.risk
            .as_deref()
            .map(str::trim)
            .filter(|risk| !risk.is_empty())
            .map(str::to_lowercase)
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk.as_deref().and_then(|risk| risk.parse().ok())
    }

    pub fn requires_alert(&self) -> bool {
        self.risk_level().is_some_and(|level| level.requires_alert())
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text).filter(|t| !t.trim().is_empty()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Derived `{symptoms, risk}` pair published to dashboards after a medical
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisUpdate {
    pub symptoms: Vec<String>,
    pub risk: String,
}

impl AnalysisUpdate {
    pub fn from_metadata(metadata: &TriageMetadata) -> Self {
        Self {
            symptoms: metadata.symptoms.clone(),
            risk: metadata
                .normalized_risk()
                .unwrap_or_else(|| RiskLevel::Low.to_string()),
        }
    }
}

/// One record of the `/triage` NDJSON stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageEvent {
    Metadata(TriageMetadata),
    Chunk(String),
    /// Unrecognised record, passed through untouched.
    Other { kind: Option<String>, payload: Value },
}

impl TriageEvent {
    pub fn from_line(line: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self, AppError> {
        if !value.is_object() {
            return Err(AppError::Protocol(format!(
                "Expected a JSON object, got: {}",
                value
            )));
        }

        let kind = value.get("type").and_then(Value::as_str).map(str::to_string);

        match kind.as_deref() {
            Some("metadata") => {
                let data = value.get_mut("data").map(Value::take).unwrap_or(Value::Null);
                if data.is_null() {
                    return Err(AppError::Protocol("metadata event without data".to_string()));
                }
                Ok(TriageEvent::Metadata(serde_json::from_value(data)?))
            }
            Some("chunk") => match value.get("content") {
                Some(Value::String(content)) => Ok(TriageEvent::Chunk(content.clone())),
                Some(Value::Null) | None => Ok(TriageEvent::Chunk(String::new())),
                Some(other) => Err(AppError::Protocol(format!(
                    "chunk content is not a string: {}",
                    other
                ))),
            },
            // Legacy single-document response: the classification itself.
            None if value.get("mode").is_some() => {
                Ok(TriageEvent::Metadata(serde_json::from_value(value)?))
            }
            _ => Ok(TriageEvent::Other {
                kind,
                payload: value,
            }),
        }
    }
}
