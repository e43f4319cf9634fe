use crate::error::StoreError;
use serde_json::{Map, Value};
use std::fmt;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// A stored record: a flat JSON object.
pub type Record = Map<String, Value>;

/// Opaque identifier of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    /// Where the user's editable document lives.
    pub fn document(user: &UserKey) -> Self {
        Self(format!("user_data/{user}"))
    }

    /// Where the user's login profile lives.
    pub fn profile(user: &UserKey) -> Self {
        Self(format!("users/{user}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External persistence for per-user records.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, key: &StoreKey) -> Result<Option<Record>, StoreError>;

    /// Writes `fields` under `key`. With `merge`, fields already stored but
    /// absent from `fields` survive; without it the record is replaced.
    async fn save(&self, key: &StoreKey, fields: Record, merge: bool) -> Result<(), StoreError>;
}

pub(crate) fn apply_fields(existing: Option<Record>, fields: Record, merge: bool) -> Record {
    match existing {
        Some(mut record) if merge => {
            record.extend(fields);
            record
        }
        _ => fields,
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_fields, Record, StoreKey, UserKey};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("fixture should be an object")
    }

    #[test]
    fn store_keys_separate_documents_from_profiles() {
        let user = UserKey::new("u-42");
        assert_eq!(StoreKey::document(&user).as_str(), "user_data/u-42");
        assert_eq!(StoreKey::profile(&user).as_str(), "users/u-42");
    }

    #[test]
    fn apply_fields_merge_keeps_unrelated_fields() {
        let existing = record(json!({ "htmlCode": "old", "theme": "dark" }));
        let merged = apply_fields(Some(existing), record(json!({ "htmlCode": "new" })), true);
        assert_eq!(merged, record(json!({ "htmlCode": "new", "theme": "dark" })));
    }

    #[test]
    fn apply_fields_without_merge_replaces_record() {
        let existing = record(json!({ "htmlCode": "old", "theme": "dark" }));
        let replaced = apply_fields(Some(existing), record(json!({ "htmlCode": "new" })), false);
        assert_eq!(replaced, record(json!({ "htmlCode": "new" })));
    }
}
