//! Chat transcript with the coding assistant.
//!
//! One exchange runs at a time: a submission made while a reply is pending
//! is ignored, so replies can never interleave.

use crate::error::ResponderError;
use crate::event::{AppEvent, EventSender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

pub mod responder;

pub use responder::{CannedResponder, FailingResponder};

pub const GREETING: &str = "Hey, I am your personal coding assistant. How can I help you today?";

pub const FALLBACK_REPLY: &str =
    "Sorry, I am unable to connect to the AI agent right now. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The assistant backend. Only the latest user message is passed; any
/// wider context is the backend's own business.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, latest_user_message: &str) -> Result<String, ResponderError>;
}

#[derive(Debug)]
pub enum AssistantEvent {
    Replied {
        epoch: u64,
        outcome: Result<String, ResponderError>,
    },
}

pub struct AssistantSession {
    runtime_handle: Handle,
    responder: Arc<dyn Responder>,
    events: EventSender,
    transcript: Vec<ChatMessage>,
    pending: bool,
    epoch: u64,
}

fn initial_transcript() -> Vec<ChatMessage> {
    vec![ChatMessage::assistant(GREETING)]
}

impl AssistantSession {
    pub fn new(runtime_handle: Handle, responder: Arc<dyn Responder>, events: EventSender) -> Self {
        Self {
            runtime_handle,
            responder,
            events,
            transcript: initial_transcript(),
            pending: false,
            epoch: 0,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Sends `text` to the responder. Returns `false` without touching the
    /// transcript when the text is blank or a reply is still pending.
    pub fn submit(&mut self, text: &str) -> bool {
        let prompt = text.trim();
        if prompt.is_empty() {
            return false;
        }
        if self.pending {
            debug!("ignoring submission while a reply is pending");
            return false;
        }

        self.transcript.push(ChatMessage::user(prompt));
        self.pending = true;

        let epoch = self.epoch;
        let prompt = prompt.to_string();
        let responder = Arc::clone(&self.responder);
        let events = self.events.clone();
        self.runtime_handle.spawn(async move {
            let outcome = responder.respond(&prompt).await;
            let _ = events.send(AppEvent::Assistant(AssistantEvent::Replied { epoch, outcome }));
        });
        true
    }

    pub fn apply_event(&mut self, event: AssistantEvent) {
        match event {
            AssistantEvent::Replied { epoch, outcome } => {
                if epoch != self.epoch || !self.pending {
                    debug!(epoch, "discarding reply from a reset session");
                    return;
                }
                let reply = match outcome {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, "assistant responder failed");
                        FALLBACK_REPLY.to_string()
                    }
                };
                self.transcript.push(ChatMessage::assistant(reply));
                self.pending = false;
            }
        }
    }

    /// Back to the greeting only. A reply still in flight is dropped on
    /// arrival.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.transcript = initial_transcript();
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AssistantSession, CannedResponder, ChatMessage, FailingResponder, Responder, Role,
        FALLBACK_REPLY, GREETING,
    };
    use crate::event::{self, AppEvent, EventReceiver};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn session(responder: Arc<dyn Responder>) -> (AssistantSession, EventReceiver) {
        let (tx, rx) = event::channel();
        (AssistantSession::new(Handle::current(), responder, tx), rx)
    }

    async fn settle(session: &mut AssistantSession, rx: &mut EventReceiver, wait: Duration) {
        tokio::time::sleep(wait).await;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Assistant(event) = event {
                session.apply_event(event);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_starts_with_greeting() {
        let (session, _rx) = session(Arc::new(CannedResponder::default()));
        assert_eq!(session.transcript(), [ChatMessage::assistant(GREETING)]);
        assert!(!session.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_submission_is_ignored() {
        let (mut session, _rx) = session(Arc::new(CannedResponder::default()));

        assert!(!session.submit(""));
        assert!(!session.submit("   \n\t"));
        assert_eq!(session.transcript().len(), 1);
        assert!(!session.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_appends_user_message_then_reply() {
        let responder = CannedResponder::new("sure thing").with_latency(Duration::from_millis(300));
        let (mut session, mut rx) = session(Arc::new(responder));

        assert!(session.submit("  add a button  "));
        assert!(session.is_pending());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1], ChatMessage::user("add a button"));

        settle(&mut session, &mut rx, Duration::from_millis(400)).await;
        assert!(!session.is_pending());
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2].role(), Role::Assistant);
        assert_eq!(session.transcript()[2].content(), "sure thing");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_pending_is_rejected() {
        let responder = CannedResponder::new("reply").with_latency(Duration::from_millis(300));
        let (mut session, mut rx) = session(Arc::new(responder));

        assert!(session.submit("first"));
        assert!(!session.submit("hi"));
        assert_eq!(session.transcript().len(), 2);

        settle(&mut session, &mut rx, Duration::from_millis(400)).await;
        assert_eq!(session.transcript().len(), 3);
        assert!(session.submit("hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn responder_failure_appends_fallback_message() {
        let (mut session, mut rx) = session(Arc::new(FailingResponder::default()));

        assert!(session.submit("hello"));
        settle(&mut session, &mut rx, Duration::from_millis(10)).await;

        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], ChatMessage::assistant(FALLBACK_REPLY));
        assert!(!session.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_greeting_and_drops_late_reply() {
        let responder = CannedResponder::new("late").with_latency(Duration::from_millis(300));
        let (mut session, mut rx) = session(Arc::new(responder));

        assert!(session.submit("question"));
        session.reset();
        assert_eq!(session.transcript(), [ChatMessage::assistant(GREETING)]);
        assert!(!session.is_pending());

        settle(&mut session, &mut rx, Duration::from_millis(400)).await;
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn chat_message_serializes_lowercase_role() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).expect("message should serialize");
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
