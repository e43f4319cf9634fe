use super::Responder;
use crate::error::ResponderError;
use std::time::Duration;

pub const DEMO_REPLY: &str = "I can't execute code directly, but I can help you with that. \
The code you provided looks like a simple HTML document. If you want to add a button, \
you can add a `<button>` element inside the `<body>`.";

/// Placeholder backend that always answers with the same text.
#[derive(Debug, Clone)]
pub struct CannedResponder {
    reply: String,
    latency: Duration,
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::new(DEMO_REPLY)
    }
}

impl CannedResponder {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait::async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, _latest_user_message: &str) -> Result<String, ResponderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.reply.clone())
    }
}

/// Backend that is never reachable.
#[derive(Debug, Clone, Default)]
pub struct FailingResponder;

#[async_trait::async_trait]
impl Responder for FailingResponder {
    async fn respond(&self, _latest_user_message: &str) -> Result<String, ResponderError> {
        Err(ResponderError::Unavailable(
            "no assistant backend configured".to_string(),
        ))
    }
}
