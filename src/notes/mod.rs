use std::{future::Future, io, path::PathBuf, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};

mod file;
mod memory;

pub use file::{JsonNoteStore, NOTES_FILE_NAME, SCHEMA_VERSION};
pub use memory::MemoryNoteStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type NoteId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    /// Store-assigned ordering key; strictly increasing in insertion order.
    pub seq: u64,
    pub created_at: String,
    pub description: String,
}

pub trait NoteStore: Send + Sync + 'static {
    /// Appends a note. Content is stored exactly as given, empty included.
    fn insert_note(&self, content: String) -> BoxFuture<'_, Result<NoteId, StoreError>>;

    /// All notes, oldest first (ascending `seq`).
    fn fetch_all_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, StoreError>>;
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    SerdeJson(serde_json::Error),
    SchemaVersionMismatch { expected: u32, got: u32 },
    UnsupportedUrl { url: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::SerdeJson(e) => write!(f, "json error: {e}"),
            Self::SchemaVersionMismatch { expected, got } => {
                write!(f, "schema_version mismatch: expected {expected}, got {got}")
            }
            Self::UnsupportedUrl { url } => {
                write!(f, "unsupported note store url (want file:// or memory://): {url}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::SerdeJson(e) => Some(e),
            Self::SchemaVersionMismatch { .. } | Self::UnsupportedUrl { .. } => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::SerdeJson(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStoreUrl {
    File(PathBuf),
    Memory,
}

impl NoteStoreUrl {
    pub fn parse(url: &str) -> Result<Self, StoreError> {
        let trimmed = url.trim();
        if let Some(path) = trimmed.strip_prefix("file://") {
            if path.is_empty() {
                return Err(StoreError::UnsupportedUrl {
                    url: url.to_string(),
                });
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if trimmed == "memory://" || trimmed == "memory:" {
            return Ok(Self::Memory);
        }
        Err(StoreError::UnsupportedUrl {
            url: url.to_string(),
        })
    }

    /// One attempt at opening the store this URL names.
    pub async fn open(&self) -> Result<Arc<dyn NoteStore>, StoreError> {
        match self {
            Self::File(dir) => {
                let store = JsonNoteStore::open(dir)?;
                Ok(Arc::new(store))
            }
            Self::Memory => Ok(Arc::new(MemoryNoteStore::new())),
        }
    }
}

/// Parses `url` and opens the note store it names. A single attempt;
/// callers that must wait for the store use `connect::connect_note_store`.
pub async fn open_note_store(url: &str) -> Result<Arc<dyn NoteStore>, StoreError> {
    NoteStoreUrl::parse(url)?.open().await
}
