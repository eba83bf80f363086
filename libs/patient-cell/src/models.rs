use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::triage::{AnalysisUpdate, RiskLevel};
use shared_models::Identifier;

pub const QUEUE_PATH: &str = "/queue";

pub const AI_ANALYSIS_ENTRY_ID: &str = "ai-analysis";

const MIN_WAIT_MINUTES: u32 = 5;
const BASE_WAIT_MINUTES: u32 = 14;
const WAIT_MINUTES_PER_URGENT: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub oxygen_level: Option<f64>,
}

/// One patient waiting to be seen, as listed by `GET /queue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub wait_time: Option<String>,
}

impl QueueEntry {
    /// Pseudo-entry describing the patient currently talking to the
    /// assistant, built from the latest medical classification.
    pub fn from_analysis(name: &str, analysis: &AnalysisUpdate) -> Self {
        Self {
            id: Identifier::from(AI_ANALYSIS_ENTRY_ID),
            name: if name.trim().is_empty() {
                "Current Patient".to_string()
            } else {
                name.to_string()
            },
            age: None,
            gender: None,
            severity: Some(analysis.risk.to_lowercase()),
            symptoms: analysis.symptoms.clone(),
            vitals: None,
            status: Some("AI Triage".to_string()),
            wait_time: Some("0 min".to_string()),
        }
    }

    pub fn severity_level(&self) -> Option<RiskLevel> {
        self.severity.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn is_urgent(&self) -> bool {
        self.severity_level().is_some_and(|level| level.requires_alert())
    }
}

/// Dashboard counters derived from one queue listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    /// Entries whose severity label was missing or unrecognised.
    pub unclassified: usize,
    pub urgent: usize,
    pub average_wait_minutes: u32,
}

impl QueueSummary {
    pub fn from_entries(entries: &[QueueEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            match entry.severity_level() {
                Some(RiskLevel::Low) => summary.low += 1,
                Some(RiskLevel::Medium) => summary.medium += 1,
                Some(RiskLevel::High) => summary.high += 1,
                Some(RiskLevel::Critical) => summary.critical += 1,
                None => summary.unclassified += 1,
            }
        }

        summary.urgent = summary.high + summary.critical;
        summary.average_wait_minutes = estimated_wait_minutes(summary.urgent);
        summary
    }
}

pub fn estimated_wait_minutes(urgent: usize) -> u32 {
    let urgent = u32::try_from(urgent).unwrap_or(u32::MAX);
    BASE_WAIT_MINUTES
        .saturating_add(urgent.saturating_mul(WAIT_MINUTES_PER_URGENT))
        .max(MIN_WAIT_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub summary: QueueSummary,
    pub fetched_at: DateTime<Utc>,
}

impl QueueSnapshot {
    pub fn new(entries: Vec<QueueEntry>) -> Self {
        Self {
            summary: QueueSummary::from_entries(&entries),
            entries,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, severity: Option<&str>) -> QueueEntry {
        QueueEntry {
            id: Identifier::Numeric(id),
            name: format!("Patient {}", id),
            age: None,
            gender: None,
            severity: severity.map(str::to_string),
            symptoms: Vec::new(),
            vitals: None,
            status: None,
            wait_time: None,
        }
    }

    #[test]
    fn test_queue_entry_wire_format() {
        let entry: QueueEntry = serde_json::from_str(
            r#"{
                "id": "p-17",
                "name": "Asha",
                "age": 34,
                "gender": "female",
                "severity": "High",
                "symptoms": ["fever"],
                "vitals": {"heartRate": 112, "temperature": 101.4, "bloodPressure": "140/90", "oxygenLevel": 93},
                "status": "Waiting",
                "waitTime": "5 min"
            }"#,
        )
        .unwrap();

        assert_eq!(entry.id, Identifier::Text("p-17".to_string()));
        assert_eq!(entry.severity_level(), Some(RiskLevel::High));
        assert!(entry.is_urgent());
        let vitals = entry.vitals.unwrap();
        assert_eq!(vitals.heart_rate, Some(112.0));
        assert_eq!(vitals.blood_pressure.as_deref(), Some("140/90"));
        assert_eq!(entry.wait_time.as_deref(), Some("5 min"));
    }

    #[test]
    fn test_summary_counts_and_wait() {
        let entries = vec![
            entry(1, Some("low")),
            entry(2, Some("HIGH")),
            entry(3, Some("critical")),
            entry(4, Some("medium")),
            entry(5, None),
            entry(6, Some("severe")),
        ];

        let summary = QueueSummary::from_entries(&entries);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.unclassified, 2);
        assert_eq!(summary.urgent, 2);
        assert_eq!(summary.average_wait_minutes, 18);
    }

    #[test]
    fn test_empty_queue_summary() {
        let summary = QueueSummary::from_entries(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_wait_minutes, 14);
    }

    #[test]
    fn test_entry_from_analysis() {
        let analysis = AnalysisUpdate {
            symptoms: vec!["chest pain".to_string()],
            risk: "Critical".to_string(),
        };
        let entry = QueueEntry::from_analysis("", &analysis);

        assert_eq!(entry.id, Identifier::from(AI_ANALYSIS_ENTRY_ID));
        assert_eq!(entry.name, "Current Patient");
        assert_eq!(entry.severity.as_deref(), Some("critical"));
        assert_eq!(entry.status.as_deref(), Some("AI Triage"));
        assert!(entry.is_urgent());
    }
}
