use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use shared_models::chat::ChatMessage;
use shared_models::error::AppError;
use shared_models::triage::{TriageEvent, TriageRequest};
use shared_models::Identifier;

use crate::models::{AppliedEvent, ChatUpdate, TriageDisplay, TurnOutcome, TurnState};
use crate::services::alerts::AlertPlayer;
use crate::services::stream::TriageTransport;
use crate::services::transcript::ChatTranscript;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Transcript and the token of its streaming turn, always locked together.
#[derive(Default)]
struct Conversation {
    transcript: ChatTranscript,
    in_flight: Option<InFlight>,
}

/// One patient's conversation with the triage backend.
pub struct ChatSession {
    transport: Arc<dyn TriageTransport>,
    alert: Arc<dyn AlertPlayer>,
    conversation: Mutex<Conversation>,
    updates: broadcast::Sender<ChatUpdate>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn TriageTransport>, alert: Arc<dyn AlertPlayer>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            transport,
            alert,
            conversation: Mutex::new(Conversation::default()),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatUpdate> {
        self.updates.subscribe()
    }

    #[instrument(skip(self, text))]
    pub async fn send(
        &self,
        text: &str,
        user_id: Option<Identifier>,
    ) -> Result<TurnOutcome, AppError> {
        let (ticket, cancel) = {
            let mut conversation = self.conversation();
            let Some(ticket) = conversation.transcript.begin_turn(text)? else {
                return Ok(TurnOutcome::Skipped);
            };
            let cancel = CancellationToken::new();
            conversation.in_flight = Some(InFlight {
                generation: ticket.generation,
                cancel: cancel.clone(),
            });
            (ticket, cancel)
        };

        self.publish(ChatUpdate::TurnStarted {
            user_message_id: ticket.user_message_id.clone(),
            assistant_message_id: ticket.assistant_message_id.clone(),
        });

        let request = TriageRequest::new(ticket.message.clone(), user_id);
        let mut on_event = |event: TriageEvent| {
            let applied = self.conversation().transcript.apply(&ticket, event);
            if let Some(applied) = applied {
                self.fan_out(applied);
            }
        };

        let result = self
            .transport
            .stream_triage(&request, &cancel, &mut on_event)
            .await;

        let failure = result.as_ref().err();
        if let Ok(summary) = &result {
            debug!(
                "Turn {} streamed {} events ({} dropped)",
                ticket.generation, summary.events, summary.dropped_lines
            );
        }

        let settled = {
            let mut conversation = self.conversation();
            if conversation
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == ticket.generation)
            {
                conversation.in_flight = None;
            }
            conversation.transcript.settle(&ticket, failure)
        };
        let Some(content) = settled else {
            info!("Turn {} superseded by a clear", ticket.generation);
            return Ok(TurnOutcome::Superseded);
        };

        let outcome = match failure {
            None => TurnOutcome::Completed,
            Some(err) => TurnOutcome::Failed {
                reason: err.to_string(),
            },
        };

        self.publish(ChatUpdate::Settled {
            message_id: ticket.assistant_message_id.clone(),
            outcome: outcome.clone(),
            content,
        });

        Ok(outcome)
    }

    /// Resets to the greeting and abandons any in-flight stream.
    pub fn clear(&self) {
        {
            let mut conversation = self.conversation();
            conversation.transcript.clear();
            if let Some(in_flight) = conversation.in_flight.take() {
                debug!("Cancelling in-flight turn {}", in_flight.generation);
                in_flight.cancel.cancel();
            }
        }

        self.publish(ChatUpdate::Cleared);
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation().transcript.messages().to_vec()
    }

    pub fn display(&self) -> TriageDisplay {
        self.conversation().transcript.display().clone()
    }

    pub fn state(&self) -> TurnState {
        self.conversation().transcript.state()
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_in_flight()
    }

    fn fan_out(&self, applied: AppliedEvent) {
        let AppliedEvent {
            message_id,
            delta,
            metadata,
            analysis,
            raise_alert,
        } = applied;

        if let Some(content) = delta {
            self.publish(ChatUpdate::Delta {
                message_id: message_id.clone(),
                content,
            });
        }
        if let Some(metadata) = metadata {
            self.publish(ChatUpdate::MetadataAttached {
                message_id,
                metadata: Box::new(metadata),
            });
        }
        if let Some(analysis) = analysis {
            self.publish(ChatUpdate::Analysis(analysis));
        }
        if raise_alert {
            if let Err(err) = self.alert.play() {
                warn!("Failed to play risk alert: {}", err);
            }
        }
    }

    fn publish(&self, update: ChatUpdate) {
        // no receivers is fine
        let _ = self.updates.send(update);
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
