//! Keeps the edited document, its live preview and its stored copy in step.
//!
//! The engine is owned by one thread and mutated only through its methods.
//! Store calls run on the runtime and report back as [`SyncEvent`]s, which the
//! owner feeds into [`SyncEngine::apply_event`]. Results from a session that
//! has since been torn down are dropped there.

use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::event::{AppEvent, EventSender};
use crate::sandbox::{Renderer, SandboxRenderer};
use crate::store::{DocumentStore, Record, StoreKey, UserKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>My First Project</title>
  <style>
    body {
      background-color: #1a202c;
      color: #cbd5e0;
      font-family: sans-serif;
      display: flex;
      justify-content: center;
      align-items: center;
      height: 100vh;
      margin: 0;
    }
    h1 {
      font-size: 2.5rem;
      background: -webkit-linear-gradient(45deg, #a78bfa, #f472b6);
      -webkit-background-clip: text;
      -webkit-text-fill-color: transparent;
    }
  </style>
</head>
<body>
  <h1>Hello, World!</h1>
</body>
</html>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            content: DEFAULT_DOCUMENT.to_string(),
            revision: 0,
        }
    }
}

/// Stored shape of a document record. Records written before revisions
/// were tracked load as revision 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub html_code: String,
    #[serde(default)]
    pub revision: u64,
}

impl StoredDocument {
    fn from_record(key: &StoreKey, record: Record) -> Result<Self, StoreError> {
        serde_json::from_value(Value::Object(record)).map_err(|err| StoreError::Malformed {
            key: key.to_string(),
            message: err.to_string(),
        })
    }
}

/// A snapshot queued for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistRequest {
    pub content: String,
    pub issued_at_revision: u64,
}

impl PersistRequest {
    fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("htmlCode".to_string(), Value::String(self.content));
        record.insert(
            "revision".to_string(),
            Value::from(self.issued_at_revision),
        );
        record
    }
}

#[derive(Debug)]
pub enum SyncEvent {
    Loaded {
        session: u64,
        outcome: Result<Option<Record>, StoreError>,
    },
    Persisted {
        session: u64,
        revision: u64,
    },
    PersistFailed {
        session: u64,
        revision: u64,
        message: String,
    },
}

/// Serializes writes for one session so they reach the store in the order
/// they fired, and skips any write older than what is already stored.
#[derive(Clone)]
struct WriteLane {
    session: u64,
    key: StoreKey,
    store: Arc<dyn DocumentStore>,
    events: EventSender,
    order: Arc<Mutex<()>>,
    persisted: Arc<AtomicU64>,
}

impl WriteLane {
    async fn persist(self, request: PersistRequest) {
        let _turn = self.order.lock().await;
        let revision = request.issued_at_revision;
        if revision < self.persisted.load(Ordering::SeqCst) {
            debug!(key = %self.key, revision, "skipping superseded document write");
            return;
        }

        let event = match self.store.save(&self.key, request.into_record(), true).await {
            Ok(()) => {
                self.persisted.fetch_max(revision, Ordering::SeqCst);
                debug!(key = %self.key, revision, "document persisted");
                SyncEvent::Persisted {
                    session: self.session,
                    revision,
                }
            }
            Err(err) => {
                warn!(key = %self.key, revision, error = %err, "failed to persist document");
                SyncEvent::PersistFailed {
                    session: self.session,
                    revision,
                    message: err.to_string(),
                }
            }
        };
        let _ = self.events.send(AppEvent::Sync(event));
    }
}

struct ActiveSession {
    id: u64,
    user: UserKey,
    token: CancellationToken,
    debouncer: Debouncer,
    lane: WriteLane,
    loading: bool,
    edited_during_load: bool,
    /// Latest snapshot held back while the load is in flight.
    held_write: Option<PersistRequest>,
    confirmed_revision: Option<u64>,
    last_error: Option<String>,
    failed_revision: Option<u64>,
}

pub struct SyncEngine<R = SandboxRenderer> {
    runtime_handle: Handle,
    store: Arc<dyn DocumentStore>,
    events: EventSender,
    renderer: R,
    document: Document,
    save_delay: Duration,
    active: Option<ActiveSession>,
    sessions_started: u64,
}

impl SyncEngine {
    pub fn new(
        runtime_handle: Handle,
        store: Arc<dyn DocumentStore>,
        events: EventSender,
        save_delay: Duration,
    ) -> Self {
        Self::with_renderer(
            runtime_handle,
            store,
            events,
            save_delay,
            SandboxRenderer::new(),
        )
    }
}

impl<R: Renderer> SyncEngine<R> {
    pub fn with_renderer(
        runtime_handle: Handle,
        store: Arc<dyn DocumentStore>,
        events: EventSender,
        save_delay: Duration,
        mut renderer: R,
    ) -> Self {
        let document = Document::default();
        renderer.render(&document.content);
        Self {
            runtime_handle,
            store,
            events,
            renderer,
            document,
            save_delay,
            active: None,
            sessions_started: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn user(&self) -> Option<&UserKey> {
        self.active.as_ref().map(|session| &session.user)
    }

    pub fn is_loading(&self) -> bool {
        self.active.as_ref().is_some_and(|session| session.loading)
    }

    /// Highest revision the store has confirmed for the active session.
    pub fn confirmed_revision(&self) -> Option<u64> {
        self.active
            .as_ref()
            .and_then(|session| session.confirmed_revision)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.active.as_ref().is_some_and(|session| {
            session
                .confirmed_revision
                .map_or(true, |confirmed| confirmed < self.document.revision)
        })
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|session| session.last_error.as_deref())
    }

    /// Starts a document session for `user`, replacing any active one, and
    /// loads the stored document in the background.
    pub fn initialize(&mut self, user: UserKey) {
        self.teardown();
        self.sessions_started += 1;
        let id = self.sessions_started;
        let key = StoreKey::document(&user);
        let token = CancellationToken::new();

        let lane = WriteLane {
            session: id,
            key: key.clone(),
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            order: Arc::new(Mutex::new(())),
            persisted: Arc::new(AtomicU64::new(0)),
        };

        info!(user = %user, session = id, "document session started");
        self.active = Some(ActiveSession {
            id,
            user,
            token: token.clone(),
            debouncer: Debouncer::child_of(self.runtime_handle.clone(), token),
            lane,
            loading: true,
            edited_during_load: false,
            held_write: None,
            confirmed_revision: None,
            last_error: None,
            failed_revision: None,
        });

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        self.runtime_handle.spawn(async move {
            let outcome = store.load(&key).await;
            let _ = events.send(AppEvent::Sync(SyncEvent::Loaded {
                session: id,
                outcome,
            }));
        });
    }

    /// Applies a local edit: bumps the revision, re-renders immediately and
    /// schedules a debounced save of this exact snapshot. While the stored
    /// copy is still loading the snapshot is held instead, and only written if
    /// it wins against what the load returns.
    pub fn apply_edit(&mut self, content: impl Into<String>) {
        self.document.content = content.into();
        self.document.revision += 1;
        self.renderer.render(&self.document.content);

        let Some(session) = self.active.as_mut() else {
            return;
        };
        let request = PersistRequest {
            content: self.document.content.clone(),
            issued_at_revision: self.document.revision,
        };
        if session.loading {
            session.edited_during_load = true;
            session.held_write = Some(request);
            return;
        }

        let lane = session.lane.clone();
        session
            .debouncer
            .schedule(self.save_delay, move || lane.persist(request));
    }

    /// Writes `content` at `at_revision` for the active session right away,
    /// or once the stored copy has loaded.
    pub fn save(&mut self, content: impl Into<String>, at_revision: u64) {
        let Some(session) = self.active.as_mut() else {
            debug!("save requested without an active document session");
            return;
        };
        let request = PersistRequest {
            content: content.into(),
            issued_at_revision: at_revision,
        };
        if session.loading {
            let newer = session
                .held_write
                .as_ref()
                .map_or(true, |held| held.issued_at_revision <= at_revision);
            if newer {
                session.held_write = Some(request);
            }
            return;
        }
        self.runtime_handle
            .spawn(session.lane.clone().persist(request));
    }

    /// Ends the active session. Pending debounced saves are discarded; writes
    /// already in flight finish but their results are ignored.
    pub fn teardown(&mut self) {
        if let Some(session) = self.active.take() {
            session.token.cancel();
            info!(user = %session.user, session = session.id, "document session torn down");
        }
    }

    /// Puts the default document back, for a signed-out editor.
    pub fn reset_document(&mut self) {
        self.document = Document::default();
        self.renderer.render(&self.document.content);
    }

    pub fn apply_event(&mut self, event: SyncEvent) {
        let session_id = match &event {
            SyncEvent::Loaded { session, .. }
            | SyncEvent::Persisted { session, .. }
            | SyncEvent::PersistFailed { session, .. } => *session,
        };
        if self.active.as_ref().map(|session| session.id) != Some(session_id) {
            debug!(session = session_id, "discarding result from a torn-down session");
            return;
        }

        match event {
            SyncEvent::Loaded { outcome, .. } => self.finish_load(outcome),
            SyncEvent::Persisted { revision, .. } => {
                if let Some(session) = self.active.as_mut() {
                    session.confirmed_revision = session.confirmed_revision.max(Some(revision));
                    if session.failed_revision.map_or(true, |failed| revision >= failed) {
                        session.last_error = None;
                        session.failed_revision = None;
                    }
                }
            }
            SyncEvent::PersistFailed {
                revision, message, ..
            } => {
                if let Some(session) = self.active.as_mut() {
                    session.last_error = Some(message);
                    session.failed_revision = session.failed_revision.max(Some(revision));
                }
            }
        }
    }

    fn finish_load(&mut self, outcome: Result<Option<Record>, StoreError>) {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        session.loading = false;
        let held_write = session.held_write.take();

        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                warn!(user = %session.user, error = %err, "failed to load document");
                if held_write.is_some() {
                    debug!(user = %session.user, "dropping held write after failed load");
                }
                session.last_error = Some(err.to_string());
                return;
            }
        };

        let Some(record) = record else {
            info!(user = %session.user, "no stored document, seeding store");
            let request = PersistRequest {
                content: self.document.content.clone(),
                issued_at_revision: self.document.revision,
            };
            self.runtime_handle
                .spawn(session.lane.clone().persist(request));
            return;
        };

        let stored = match StoredDocument::from_record(&session.lane.key, record) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(user = %session.user, error = %err, "stored document is unreadable, keeping local copy");
                session.last_error = Some(err.to_string());
                return;
            }
        };

        let local = self.document.revision;
        let adopt = stored.revision > local
            || (stored.revision == local && !session.edited_during_load);
        if !adopt {
            debug!(
                stored = stored.revision,
                local, "local document is newer than stored copy"
            );
            session
                .lane
                .persisted
                .fetch_max(stored.revision, Ordering::SeqCst);
            if let Some(request) = held_write {
                self.runtime_handle
                    .spawn(session.lane.clone().persist(request));
            }
            return;
        }

        session
            .lane
            .persisted
            .fetch_max(stored.revision, Ordering::SeqCst);
        session.confirmed_revision = Some(stored.revision);
        self.document = Document {
            content: stored.html_code,
            revision: stored.revision,
        };
        self.renderer.render(&self.document.content);
    }
}

impl<R> Drop for SyncEngine<R> {
    fn drop(&mut self) {
        if let Some(session) = self.active.take() {
            session.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, SyncEngine, SyncEvent, DEFAULT_DOCUMENT};
    use crate::event::{self, AppEvent, EventReceiver};
    use crate::sandbox::Renderer;
    use crate::store::{MemoryStore, Record, StoreKey, UserKey};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;

    const SAVE_DELAY: Duration = Duration::from_millis(500);

    #[derive(Default)]
    struct RecordingRenderer {
        renders: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, content: &str) {
            self.renders.push(content.to_string());
        }
    }

    fn engine(
        store: &Arc<MemoryStore>,
    ) -> (SyncEngine<RecordingRenderer>, EventReceiver) {
        let (tx, rx) = event::channel();
        let engine = SyncEngine::with_renderer(
            Handle::current(),
            store.clone(),
            tx,
            SAVE_DELAY,
            RecordingRenderer::default(),
        );
        (engine, rx)
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("fixture should be an object")
    }

    async fn settle(engine: &mut SyncEngine<RecordingRenderer>, rx: &mut EventReceiver, wait: Duration) {
        tokio::time::sleep(wait).await;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Sync(event) = event {
                engine.apply_event(event);
            }
        }
    }

    fn user() -> UserKey {
        UserKey::new("u1")
    }

    #[tokio::test(start_paused = true)]
    async fn new_engine_renders_default_document() {
        let store = Arc::new(MemoryStore::new());
        let (engine, _rx) = engine(&store);

        assert_eq!(engine.document(), &Document::default());
        assert_eq!(engine.renderer().renders, vec![DEFAULT_DOCUMENT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn apply_edit_renders_every_edit_in_order() {
        let store = Arc::new(MemoryStore::new());
        let (mut engine, _rx) = engine(&store);

        for content in ["<p>1</p>", "<p>12</p>", "<p>123</p>"] {
            engine.apply_edit(content);
        }

        assert_eq!(engine.document().revision, 3);
        assert_eq!(
            engine.renderer().renders.last().map(String::as_str),
            Some(engine.document().content.as_str())
        );
        assert_eq!(engine.renderer().renders.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn edit_burst_persists_once_with_last_content() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "<p>stored</p>" })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        settle(&mut engine, &mut rx, Duration::from_millis(1)).await;
        assert_eq!(engine.document().content, "<p>stored</p>");

        for n in 1..=10 {
            engine.apply_edit(format!("<p>{n}</p>"));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(store.save_count(), 0);

        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "<p>10</p>", "revision": 10 })))
        );
        assert_eq!(engine.confirmed_revision(), Some(10));
        assert!(!engine.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_without_stored_document_seeds_store_once() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        assert!(engine.is_loading());
        settle(&mut engine, &mut rx, Duration::from_millis(10)).await;
        settle(&mut engine, &mut rx, Duration::from_millis(10)).await;

        assert!(!engine.is_loading());
        assert_eq!(store.save_count(), 1);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": DEFAULT_DOCUMENT, "revision": 0 })))
        );
        assert_eq!(engine.confirmed_revision(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn local_edits_newer_than_stored_copy_survive_the_load() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 5 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        for n in 1..=6 {
            engine.apply_edit(format!("local {n}"));
        }
        settle(&mut engine, &mut rx, Duration::from_millis(250)).await;

        assert_eq!(engine.document().content, "local 6");
        assert_eq!(engine.document().revision, 6);

        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "local 6", "revision": 6 })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn newer_stored_copy_replaces_local_edit_and_drops_its_save() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 5 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        engine.apply_edit("early edit");
        settle(&mut engine, &mut rx, Duration::from_millis(250)).await;

        assert_eq!(engine.document().content, "stored");
        assert_eq!(engine.document().revision, 5);
        assert_eq!(engine.renderer().renders.last().map(String::as_str), Some("stored"));

        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;
        assert_eq!(store.save_count(), 0);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "stored", "revision": 5 })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_of_newer_stored_copy_is_never_overwritten_by_early_edit() {
        let store = Arc::new(MemoryStore::with_latency(SAVE_DELAY + Duration::from_millis(300)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 5 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        engine.apply_edit("early edit");
        settle(&mut engine, &mut rx, Duration::from_secs(3)).await;
        settle(&mut engine, &mut rx, Duration::from_secs(3)).await;

        assert_eq!(engine.document().content, "stored");
        assert_eq!(engine.document().revision, 5);
        assert!(!engine.has_unsaved_changes());
        assert_eq!(store.save_count(), 0);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "stored", "revision": 5 })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_of_older_stored_copy_writes_held_edit_once() {
        let store = Arc::new(MemoryStore::with_latency(SAVE_DELAY + Duration::from_millis(300)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 2 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        for n in 1..=4 {
            engine.apply_edit(format!("local {n}"));
        }
        tokio::time::sleep(SAVE_DELAY * 2).await;
        assert_eq!(store.save_count(), 0);

        settle(&mut engine, &mut rx, Duration::from_secs(1)).await;
        assert!(!engine.is_loading());
        settle(&mut engine, &mut rx, Duration::from_secs(3)).await;

        assert_eq!(engine.document().content, "local 4");
        assert_eq!(store.save_count(), 1);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "local 4", "revision": 4 })))
        );
        assert_eq!(engine.confirmed_revision(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_save_during_load_waits_for_the_stored_copy() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 5 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        engine.save("stale", 1);
        settle(&mut engine, &mut rx, Duration::from_secs(1)).await;
        settle(&mut engine, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(engine.document().content, "stored");
        assert_eq!(store.save_count(), 0);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "stored", "revision": 5 })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn save_merges_into_existing_record() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        store.insert(
            key.clone(),
            record(json!({ "htmlCode": "old", "revision": 1, "theme": "dark" })),
        );
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        settle(&mut engine, &mut rx, Duration::from_millis(1)).await;
        engine.apply_edit("new");
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;

        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "new", "revision": 2, "theme": "dark" })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persist_failure_is_recorded_and_editing_continues() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "old", "revision": 1 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        settle(&mut engine, &mut rx, Duration::from_millis(1)).await;
        store.set_fail_saves(true);
        engine.apply_edit("lost");
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;

        assert!(engine.last_persist_error().is_some());
        assert!(engine.has_unsaved_changes());

        store.set_fail_saves(false);
        engine.apply_edit("kept");
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;

        assert_eq!(engine.last_persist_error(), None);
        assert_eq!(store.save_count(), 2);
        assert_eq!(
            store.get(&key),
            Some(record(json!({ "htmlCode": "kept", "revision": 3 })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_of_older_write_keeps_newer_failure() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "old", "revision": 1 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        settle(&mut engine, &mut rx, Duration::from_millis(1)).await;
        store.set_fail_saves(true);
        engine.apply_edit("lost");
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;
        assert!(engine.last_persist_error().is_some());

        engine.apply_event(SyncEvent::Persisted {
            session: 1,
            revision: 1,
        });
        assert!(engine.last_persist_error().is_some());

        engine.apply_event(SyncEvent::Persisted {
            session: 1,
            revision: 2,
        });
        assert_eq!(engine.last_persist_error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_save_and_ignores_late_load() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "htmlCode": "stored", "revision": 9 })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        engine.apply_edit("unsaved");
        engine.teardown();
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;

        assert_eq!(engine.user(), None);
        assert_eq!(engine.document().content, "unsaved");
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_without_session_render_but_never_persist() {
        let store = Arc::new(MemoryStore::new());
        let (mut engine, mut rx) = engine(&store);

        engine.apply_edit("<p>draft</p>");
        settle(&mut engine, &mut rx, SAVE_DELAY * 2).await;

        assert_eq!(engine.renderer().renders.last().map(String::as_str), Some("<p>draft</p>"));
        assert_eq!(store.save_count(), 0);
        assert!(!engine.has_unsaved_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_stored_record_keeps_local_copy_without_seeding() {
        let store = Arc::new(MemoryStore::new());
        let key = StoreKey::document(&user());
        store.insert(key.clone(), record(json!({ "revision": "seven" })));
        let (mut engine, mut rx) = engine(&store);

        engine.initialize(user());
        settle(&mut engine, &mut rx, Duration::from_millis(10)).await;

        assert_eq!(engine.document(), &Document::default());
        assert!(engine.last_persist_error().is_some());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_document_restores_default_and_renders_it() {
        let store = Arc::new(MemoryStore::new());
        let (mut engine, _rx) = engine(&store);

        engine.apply_edit("<p>mine</p>");
        engine.reset_document();

        assert_eq!(engine.document(), &Document::default());
        assert_eq!(
            engine.renderer().renders.last().map(String::as_str),
            Some(DEFAULT_DOCUMENT)
        );
    }
}
