use super::{apply_fields, DocumentStore, Record, StoreKey};
use crate::error::StoreError;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores each record as a pretty-printed JSON file under a root directory.
///
/// Key segments become directories: `user_data/<uid>` lives at
/// `<root>/user_data/<uid>.json`, with each segment percent-encoded.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

/// Percent-encodes every byte outside `[A-Za-z0-9._@-]`, so distinct key
/// segments always map to distinct file names. Empty and dot-only segments
/// are fully encoded to stay inside the root.
fn encode_segment(segment: &str) -> String {
    let dots_only = segment.bytes().all(|byte| byte == b'.');
    if segment.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        let keep = !dots_only
            && (byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'@'));
        if keep {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &StoreKey) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = key.as_str().split('/').peekable();
        while let Some(segment) = segments.next() {
            let segment = encode_segment(segment);
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.json"));
            }
        }
        path
    }

    async fn read_record(&self, key: &StoreKey) -> Result<Option<Record>, StoreError> {
        let path = self.record_path(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(path, err)),
        };

        match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Object(record)) => Ok(Some(record)),
            Ok(_) => Err(StoreError::Malformed {
                key: key.to_string(),
                message: format!("{} does not hold a JSON object", path.display()),
            }),
            Err(err) => Err(StoreError::Malformed {
                key: key.to_string(),
                message: format!("failed to parse {}: {err}", path.display()),
            }),
        }
    }

    async fn write_record(&self, key: &StoreKey, record: &Record) -> Result<(), StoreError> {
        let final_path = self.record_path(key);
        let Some(dir) = final_path.parent() else {
            return Err(StoreError::Unavailable(format!(
                "no parent directory for {}",
                final_path.display()
            )));
        };
        fs::create_dir_all(dir)
            .await
            .map_err(|err| StoreError::io(dir, err))?;

        let tmp_path = final_path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp_path, bytes)
            .await
            .map_err(|err| StoreError::io(&tmp_path, err))?;

        match fs::rename(&tmp_path, &final_path).await {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if fs::try_exists(&final_path).await.unwrap_or(false) {
                    fs::remove_file(&final_path)
                        .await
                        .map_err(|err| StoreError::io(&final_path, err))?;
                    fs::rename(&tmp_path, &final_path)
                        .await
                        .map_err(|err| StoreError::io(&final_path, err))
                } else {
                    Err(StoreError::io(final_path, rename_err))
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, key: &StoreKey) -> Result<Option<Record>, StoreError> {
        self.read_record(key).await
    }

    async fn save(&self, key: &StoreKey, fields: Record, merge: bool) -> Result<(), StoreError> {
        let existing = if merge {
            self.read_record(key).await?
        } else {
            None
        };
        let record = apply_fields(existing, fields, merge);
        self.write_record(key, &record).await
    }
}
