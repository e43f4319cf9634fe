use crate::assistant::AssistantEvent;
use crate::sync::SyncEvent;
use tokio::sync::mpsc;

/// Everything background tasks report back to the thread that owns the state.
#[derive(Debug)]
pub enum AppEvent {
    Sync(SyncEvent),
    Assistant(AssistantEvent),
    Diagnostic(String),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
