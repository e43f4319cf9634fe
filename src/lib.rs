//! Live-preview editing core: an edited HTML document mirrored into a
//! sandboxed preview and persisted behind a debounce, plus a chat transcript
//! with a coding assistant.

pub mod assistant;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod sandbox;
pub mod session;
pub mod store;
pub mod sync;
pub mod typing;

pub use config::Config;
pub use event::AppEvent;
pub use session::{Identity, IdentityEvent, Workspace};
pub use sync::{Document, SyncEngine};
