use tracing::{debug, warn};

use shared_models::chat::ChatMessage;
use shared_models::error::AppError;
use shared_models::triage::{AnalysisUpdate, TriageEvent};

use crate::models::{
    AppliedEvent, TriageDisplay, TurnState, TurnTicket, GREETING_MESSAGE, NO_REPLY_FALLBACK,
    TRIAGE_FAILURE_MESSAGE,
};

#[derive(Debug)]
struct ActiveTurn {
    generation: u64,
    assistant_message_id: String,
    metadata_seen: bool,
    alert_raised: bool,
}

/// Ordered chat history plus the state of the turn currently streaming.
///
/// Every send bumps the generation; `clear` bumps it too, so events and
/// settles carrying an older ticket are discarded.
#[derive(Debug)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    state: TurnState,
    generation: u64,
    active: Option<ActiveTurn>,
    display: TriageDisplay,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING_MESSAGE)],
            state: TurnState::Idle,
            generation: 0,
            active: None,
            display: TriageDisplay::default(),
        }
    }

    /// Appends the user message and an empty assistant placeholder.
    ///
    /// Returns `Ok(None)` for blank input and `Conflict` while another turn
    /// is still streaming.
    pub fn begin_turn(&mut self, text: &str) -> Result<Option<TurnTicket>, AppError> {
        if text.trim().is_empty() {
            debug!("Ignoring blank chat input");
            return Ok(None);
        }
        if self.state.is_in_flight() {
            return Err(AppError::Conflict(
                "A triage request is already in progress".to_string(),
            ));
        }

        self.generation += 1;

        let user = ChatMessage::user(text);
        let assistant = ChatMessage::assistant("");
        let ticket = TurnTicket {
            generation: self.generation,
            user_message_id: user.id.clone(),
            assistant_message_id: assistant.id.clone(),
            message: text.to_string(),
        };

        self.messages.push(user);
        self.messages.push(assistant);
        self.display = TriageDisplay::default();
        self.active = Some(ActiveTurn {
            generation: self.generation,
            assistant_message_id: ticket.assistant_message_id.clone(),
            metadata_seen: false,
            alert_raised: false,
        });
        self.state = TurnState::Sending;

        debug!("Started turn generation {}", self.generation);
        Ok(Some(ticket))
    }

    pub fn is_current(&self, ticket: &TurnTicket) -> bool {
        self.active.as_ref().is_some_and(|active| {
            active.generation == ticket.generation
                && active.assistant_message_id == ticket.assistant_message_id
        })
    }

    /// Applies one stream event to the in-flight assistant message.
    /// `None` when the ticket is stale or the event changes nothing.
    pub fn apply(&mut self, ticket: &TurnTicket, event: TriageEvent) -> Option<AppliedEvent> {
        if !self.is_current(ticket) {
            debug!(
                "Discarding event for stale generation {} (current {})",
                ticket.generation, self.generation
            );
            return None;
        }

        let index = self.assistant_index(&ticket.assistant_message_id)?;
        if self.state == TurnState::Sending {
            self.state = TurnState::StreamingReply;
        }

        let active = self.active.as_mut()?;
        let message = &mut self.messages[index];

        match event {
            TriageEvent::Chunk(content) => {
                if content.is_empty() {
                    return None;
                }
                message.content.push_str(&content);
                Some(AppliedEvent {
                    message_id: message.id.clone(),
                    delta: Some(content),
                    ..Default::default()
                })
            }
            TriageEvent::Metadata(metadata) => {
                if active.metadata_seen {
                    warn!("Ignoring repeated metadata for message {}", message.id);
                    return None;
                }
                active.metadata_seen = true;

                self.display = TriageDisplay::from_metadata(&metadata);

                let analysis = metadata
                    .is_medical()
                    .then(|| AnalysisUpdate::from_metadata(&metadata));

                let raise_alert = metadata.requires_alert() && !active.alert_raised;
                active.alert_raised |= raise_alert;

                // streamed content is never overwritten; `settle` falls back to `reply`
                message.metadata = Some(metadata.clone());

                Some(AppliedEvent {
                    message_id: message.id.clone(),
                    delta: None,
                    metadata: Some(metadata),
                    analysis,
                    raise_alert,
                })
            }
            TriageEvent::Other { kind, .. } => {
                debug!("Ignoring unrecognised stream event {:?}", kind);
                None
            }
        }
    }

    /// Closes the turn. Returns the assistant message's final content, or
    /// `None` if the ticket is stale.
    pub fn settle(&mut self, ticket: &TurnTicket, failure: Option<&AppError>) -> Option<String> {
        if !self.is_current(ticket) {
            debug!("Discarding settle for stale generation {}", ticket.generation);
            return None;
        }

        let index = self.assistant_index(&ticket.assistant_message_id)?;
        let message = &mut self.messages[index];

        match failure {
            Some(err) => {
                warn!("Triage turn failed: {}", err);
                message.content = TRIAGE_FAILURE_MESSAGE.to_string();
            }
            None if message.content.is_empty() => {
                message.content = fallback_content(message);
            }
            None => {}
        }

        self.active = None;
        self.state = TurnState::Settled;
        Some(message.content.clone())
    }

    /// Back to the single greeting, whatever state the transcript is in.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::assistant(GREETING_MESSAGE)];
        self.display = TriageDisplay::default();
        self.generation += 1;
        self.active = None;
        self.state = TurnState::Idle;
        debug!("Transcript cleared, generation now {}", self.generation);
    }

    fn assistant_index(&self, id: &str) -> Option<usize> {
        self.messages.iter().rposition(|m| m.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn display(&self) -> &TriageDisplay {
        &self.display
    }
}

fn fallback_content(message: &ChatMessage) -> String {
    let from_metadata = message.metadata.as_ref().and_then(|metadata| {
        if metadata.is_medical() {
            metadata.advice.clone()
        } else {
            metadata.reply.clone()
        }
    });

    from_metadata
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| NO_REPLY_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::chat::MessageRole;
    use shared_models::triage::{RiskLevel, TriageMetadata, TriageMode};

    fn medical(risk: &str) -> TriageMetadata {
        TriageMetadata {
            mode: TriageMode::Medical,
            risk: Some(risk.to_string()),
            symptoms: vec!["chest pain".to_string()],
            doctor: Some("Cardiologist".to_string()),
            advice: Some("Go to the emergency room.".to_string()),
            ..Default::default()
        }
    }

    fn chunk(text: &str) -> TriageEvent {
        TriageEvent::Chunk(text.to_string())
    }

    #[test]
    fn test_new_transcript_has_greeting() {
        let transcript = ChatTranscript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, GREETING_MESSAGE);
        assert_eq!(transcript.state(), TurnState::Idle);
    }

    #[test]
    fn test_begin_turn_appends_user_and_placeholder() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("I have a fever").unwrap().unwrap();

        assert_eq!(transcript.len(), 3);
        let user = &transcript.messages()[1];
        let placeholder = &transcript.messages()[2];
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.content, "I have a fever");
        assert_eq!(placeholder.role, MessageRole::Assistant);
        assert!(placeholder.content.is_empty());
        assert_eq!(placeholder.id, ticket.assistant_message_id);
        assert_eq!(transcript.state(), TurnState::Sending);
    }

    #[test]
    fn test_blank_input_is_a_no_op() {
        let mut transcript = ChatTranscript::new();
        for input in ["", "   ", "\n\t "] {
            assert_eq!(transcript.begin_turn(input).unwrap(), None);
        }
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.state(), TurnState::Idle);
    }

    #[test]
    fn test_second_send_while_in_flight_conflicts() {
        let mut transcript = ChatTranscript::new();
        transcript.begin_turn("first").unwrap();

        assert_matches!(transcript.begin_turn("second"), Err(AppError::Conflict(_)));
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_chunks_concatenate_in_order() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("hi").unwrap().unwrap();

        let applied = transcript.apply(&ticket, chunk("Hel")).unwrap();
        assert_eq!(applied.delta.as_deref(), Some("Hel"));
        assert_eq!(transcript.state(), TurnState::StreamingReply);
        transcript.apply(&ticket, chunk("lo")).unwrap();

        let content = transcript.settle(&ticket, None).unwrap();
        assert_eq!(content, "Hello");
        assert_eq!(transcript.state(), TurnState::Settled);
    }

    #[test]
    fn test_high_risk_metadata_normalises_and_alerts_once() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("chest pain").unwrap().unwrap();

        let applied = transcript.apply(&ticket, TriageEvent::Metadata(medical("HIGH"))).unwrap();
        let analysis = applied.analysis.unwrap();
        assert_eq!(analysis.risk, "high");
        assert_eq!(analysis.symptoms, vec!["chest pain".to_string()]);
        assert!(applied.raise_alert);

        // a repeated metadata record neither re-attaches nor re-alerts
        assert!(transcript.apply(&ticket, TriageEvent::Metadata(medical("HIGH"))).is_none());

        let display = transcript.display();
        assert_eq!(display.severity, Some(RiskLevel::High));
        assert_eq!(display.doctor.as_deref(), Some("Cardiologist"));

        let message = transcript.message(&ticket.assistant_message_id).unwrap();
        assert_eq!(message.metadata.as_ref().unwrap().risk.as_deref(), Some("HIGH"));
    }

    #[test]
    fn test_low_risk_metadata_does_not_alert() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("sneezing").unwrap().unwrap();

        let applied = transcript.apply(&ticket, TriageEvent::Metadata(medical("Low"))).unwrap();
        assert!(!applied.raise_alert);
        assert_eq!(applied.analysis.unwrap().risk, "low");
    }

    #[test]
    fn test_chat_mode_uses_reply_or_fallback() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("hello").unwrap().unwrap();
        let metadata = TriageMetadata {
            mode: TriageMode::Chat,
            reply: Some("Hi there!".to_string()),
            ..Default::default()
        };

        let applied = transcript.apply(&ticket, TriageEvent::Metadata(metadata)).unwrap();
        assert!(applied.analysis.is_none());
        assert_eq!(applied.delta, None);
        assert_eq!(transcript.settle(&ticket, None).unwrap(), "Hi there!");

        let ticket = transcript.begin_turn("hello again").unwrap().unwrap();
        let metadata = TriageMetadata {
            mode: TriageMode::Chat,
            ..Default::default()
        };
        transcript.apply(&ticket, TriageEvent::Metadata(metadata)).unwrap();
        assert_eq!(transcript.settle(&ticket, None).unwrap(), NO_REPLY_FALLBACK);
    }

    #[test]
    fn test_chat_reply_never_overwrites_streamed_content() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("hello").unwrap().unwrap();
        let streamed = "Hello, I can help you with that today.";
        transcript.apply(&ticket, chunk(streamed)).unwrap();

        let metadata = TriageMetadata {
            mode: TriageMode::Chat,
            reply: Some("Hi".to_string()),
            ..Default::default()
        };
        transcript.apply(&ticket, TriageEvent::Metadata(metadata)).unwrap();
        let content = &transcript.message(&ticket.assistant_message_id).unwrap().content;
        assert_eq!(content, streamed);

        // chunks after a chat reply keep appending without repeating it
        transcript.apply(&ticket, chunk(" More.")).unwrap();
        assert_eq!(
            transcript.settle(&ticket, None).unwrap(),
            "Hello, I can help you with that today. More."
        );
    }

    #[test]
    fn test_chat_reply_then_chunks_is_not_duplicated() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("hello").unwrap().unwrap();
        let metadata = TriageMetadata {
            mode: TriageMode::Chat,
            reply: Some("Hi there!".to_string()),
            ..Default::default()
        };
        transcript.apply(&ticket, TriageEvent::Metadata(metadata)).unwrap();
        transcript.apply(&ticket, chunk("Hi there!")).unwrap();

        assert_eq!(transcript.settle(&ticket, None).unwrap(), "Hi there!");
    }

    #[test]
    fn test_medical_without_chunks_shows_advice() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("chest pain").unwrap().unwrap();
        transcript.apply(&ticket, TriageEvent::Metadata(medical("critical"))).unwrap();

        assert_eq!(transcript.settle(&ticket, None).unwrap(), "Go to the emergency room.");
    }

    #[test]
    fn test_failure_sets_fixed_message() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("fever").unwrap().unwrap();
        transcript.apply(&ticket, chunk("partial")).unwrap();

        let content = transcript
            .settle(&ticket, Some(&AppError::Transport("reset".to_string())))
            .unwrap();
        assert_eq!(content, TRIAGE_FAILURE_MESSAGE);
        assert_eq!(transcript.state(), TurnState::Settled);
    }

    #[test]
    fn test_clear_restores_single_greeting_from_any_state() {
        let mut transcript = ChatTranscript::new();
        let first = transcript.begin_turn("one").unwrap().unwrap();
        transcript.apply(&first, chunk("reply")).unwrap();
        transcript.settle(&first, None).unwrap();
        let second = transcript.begin_turn("two").unwrap().unwrap();
        transcript.apply(&second, TriageEvent::Metadata(medical("high"))).unwrap();

        transcript.clear();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, GREETING_MESSAGE);
        assert!(transcript.messages()[0].is_assistant());
        assert_eq!(transcript.state(), TurnState::Idle);
        assert!(transcript.display().is_empty());
    }

    #[test]
    fn test_events_after_clear_are_discarded() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("fever").unwrap().unwrap();
        transcript.clear();

        assert!(transcript.apply(&ticket, chunk("late")).is_none());
        assert!(transcript.settle(&ticket, None).is_none());
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].content, GREETING_MESSAGE);

        // a fresh turn after the clear is unaffected by the stale ticket
        let fresh = transcript.begin_turn("cough").unwrap().unwrap();
        assert!(fresh.generation > ticket.generation);
        assert!(transcript.apply(&ticket, chunk("late")).is_none());
        transcript.apply(&fresh, chunk("ok")).unwrap();
        assert_eq!(transcript.settle(&fresh, None).unwrap(), "ok");
    }

    #[test]
    fn test_new_turn_resets_display() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("chest pain").unwrap().unwrap();
        let metadata = TriageMetadata {
            confidence: Some("91".to_string()),
            ..medical("high")
        };
        transcript.apply(&ticket, TriageEvent::Metadata(metadata)).unwrap();
        transcript.settle(&ticket, None).unwrap();
        assert!(!transcript.display().is_empty());
        assert_eq!(transcript.display().confidence.as_deref(), Some("91"));

        transcript.begin_turn("headache").unwrap().unwrap();
        assert!(transcript.display().is_empty());
        assert_eq!(transcript.display().confidence, None);
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        let mut transcript = ChatTranscript::new();
        let ticket = transcript.begin_turn("fever").unwrap().unwrap();
        let event = TriageEvent::Other {
            kind: Some("progress".to_string()),
            payload: serde_json::json!({ "type": "progress" }),
        };

        assert!(transcript.apply(&ticket, event).is_none());
        assert_eq!(transcript.message(&ticket.assistant_message_id).unwrap().content, "");
    }
}
