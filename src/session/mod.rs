//! Sign-in lifecycle: wires the identity of the current user to the document
//! session and the assistant transcript.

use crate::assistant::{AssistantSession, Responder};
use crate::event::{AppEvent, EventSender};
use crate::sandbox::{Renderer, SandboxRenderer};
use crate::store::{DocumentStore, Record, StoreKey, UserKey};
use crate::sync::SyncEngine;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: UserKey,
    pub email: String,
}

impl Identity {
    /// Local identity derived from an email address; the address, trimmed
    /// and lowercased, doubles as the user key.
    pub fn from_email(email: &str) -> Option<Self> {
        let email = email.trim().to_lowercase();
        let (local, domain) = email.split_once('@')?;
        if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self {
            user: UserKey::new(email.clone()),
            email,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    LoggedIn(Identity),
    LoggedOut,
}

fn unix_seconds() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    }
}

/// Everything that lives for as long as someone is signed in.
pub struct Workspace<R = SandboxRenderer> {
    runtime_handle: Handle,
    store: Arc<dyn DocumentStore>,
    events: EventSender,
    identity: Option<Identity>,
    sync: SyncEngine<R>,
    assistant: AssistantSession,
}

impl Workspace {
    pub fn new(
        runtime_handle: Handle,
        store: Arc<dyn DocumentStore>,
        responder: Arc<dyn Responder>,
        events: EventSender,
        save_delay: Duration,
    ) -> Self {
        Self::with_renderer(
            runtime_handle,
            store,
            responder,
            events,
            save_delay,
            SandboxRenderer::new(),
        )
    }
}

impl<R: Renderer> Workspace<R> {
    pub fn with_renderer(
        runtime_handle: Handle,
        store: Arc<dyn DocumentStore>,
        responder: Arc<dyn Responder>,
        events: EventSender,
        save_delay: Duration,
        renderer: R,
    ) -> Self {
        let sync = SyncEngine::with_renderer(
            runtime_handle.clone(),
            Arc::clone(&store),
            events.clone(),
            save_delay,
            renderer,
        );
        let assistant = AssistantSession::new(runtime_handle.clone(), responder, events.clone());
        Self {
            runtime_handle,
            store,
            events,
            identity: None,
            sync,
            assistant,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn sync(&self) -> &SyncEngine<R> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncEngine<R> {
        &mut self.sync
    }

    pub fn assistant(&self) -> &AssistantSession {
        &self.assistant
    }

    pub fn assistant_mut(&mut self) -> &mut AssistantSession {
        &mut self.assistant
    }

    pub fn handle_identity(&mut self, event: IdentityEvent) {
        match event {
            IdentityEvent::LoggedIn(identity) => {
                if self.identity.as_ref() == Some(&identity) {
                    return;
                }
                if self.identity.is_some() {
                    self.sign_out();
                }
                info!(user = %identity.user, "signed in");
                self.record_login(&identity);
                self.sync.initialize(identity.user.clone());
                self.identity = Some(identity);
            }
            IdentityEvent::LoggedOut => self.sign_out(),
        }
    }

    /// Routes a background result to the component that owns its state.
    pub fn apply_event(&mut self, event: AppEvent) -> Option<String> {
        match event {
            AppEvent::Sync(event) => {
                self.sync.apply_event(event);
                None
            }
            AppEvent::Assistant(event) => {
                self.assistant.apply_event(event);
                None
            }
            AppEvent::Diagnostic(message) => Some(message),
        }
    }

    fn sign_out(&mut self) {
        let Some(identity) = self.identity.take() else {
            return;
        };
        info!(user = %identity.user, "signed out");
        self.sync.teardown();
        self.sync.reset_document();
        self.assistant.reset();
    }

    fn record_login(&self, identity: &Identity) {
        let key = StoreKey::profile(&identity.user);
        let mut fields = Record::new();
        fields.insert("email".to_string(), Value::String(identity.email.clone()));
        fields.insert("lastLogin".to_string(), Value::from(unix_seconds()));

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        self.runtime_handle.spawn(async move {
            if let Err(err) = store.save(&key, fields, true).await {
                warn!(key = %key, error = %err, "failed to record login");
                let _ = events.send(AppEvent::Diagnostic(format!(
                    "failed to record login: {err}"
                )));
            }
        });
    }
}
