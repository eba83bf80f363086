use serde::{Deserialize, Serialize};

use shared_models::triage::{AnalysisUpdate, RiskLevel, TriageMetadata};

pub const TRIAGE_PATH: &str = "/triage";

pub const GREETING_MESSAGE: &str =
    "Hello! I'm your AI Health Assistant. Please describe your symptoms.";

pub const NO_REPLY_FALLBACK: &str = "Please consult a doctor.";

pub use shared_models::error::CONNECTION_FAILURE_MESSAGE as TRIAGE_FAILURE_MESSAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    Idle,
    Sending,
    StreamingReply,
    Settled,
}

impl TurnState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnState::Sending | TurnState::StreamingReply)
    }
}

/// Handle for one send; every event and the final settle must present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    pub generation: u64,
    pub user_message_id: String,
    pub assistant_message_id: String,
    pub message: String,
}

/// Per-turn display state, reset at the start of every send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageDisplay {
    pub severity: Option<RiskLevel>,
    pub doctor: Option<String>,
    pub advice: Option<String>,
    pub confidence: Option<String>,
    pub symptoms: Vec<String>,
}

impl TriageDisplay {
    pub fn from_metadata(metadata: &TriageMetadata) -> Self {
        if !metadata.is_medical() {
            return Self::default();
        }
        Self {
            severity: metadata.risk_level(),
            doctor: metadata.doctor.clone(),
            advice: metadata.advice.clone(),
            confidence: metadata.confidence.clone(),
            symptoms: metadata.symptoms.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What applying one stream event changed, so the caller can fan out
/// side effects outside the transcript lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedEvent {
    pub message_id: String,
    pub delta: Option<String>,
    pub metadata: Option<TriageMetadata>,
    pub analysis: Option<AnalysisUpdate>,
    pub raise_alert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was appended or sent.
    Skipped,
    Completed,
    Failed { reason: String },
    /// The transcript was cleared while the stream was open.
    Superseded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub events: usize,
    pub dropped_lines: usize,
}

/// Broadcast to UI consumers as the conversation changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    TurnStarted {
        user_message_id: String,
        assistant_message_id: String,
    },
    Delta {
        message_id: String,
        content: String,
    },
    MetadataAttached {
        message_id: String,
        metadata: Box<TriageMetadata>,
    },
    Analysis(AnalysisUpdate),
    Settled {
        message_id: String,
        outcome: TurnOutcome,
        content: String,
    },
    Cleared,
}
