use std::io;
use std::path::PathBuf;

/// A load or save against the document store was rejected.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed record for key {key}: {message}")]
    Malformed { key: String, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The assistant backend could not produce a reply.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResponderError {
    #[error("responder unavailable: {0}")]
    Unavailable(String),

    #[error("responder failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
