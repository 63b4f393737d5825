use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{BoxFuture, Note, NoteId, NoteStore, StoreError};
use crate::id::new_ulid_string;

pub const SCHEMA_VERSION: u32 = 1;
pub const NOTES_FILE_NAME: &str = "notes.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct PersistedNotes {
    schema_version: u32,
    next_seq: u64,
    #[serde(default)]
    notes: Vec<Note>,
}

impl PersistedNotes {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_seq: 1,
            notes: Vec::new(),
        }
    }
}

/// Note collection kept as one JSON document on disk. Every insert rewrites
/// the document atomically, so a crash leaves either the old or the new
/// collection in place.
pub struct JsonNoteStore {
    path: PathBuf,
    state: Mutex<PersistedNotes>,
}

impl JsonNoteStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let path = data_dir.join(NOTES_FILE_NAME);
        let (state, is_new) = if path.exists() {
            let bytes = fs::read(&path)?;
            let state: PersistedNotes = serde_json::from_slice(&bytes)?;
            if state.schema_version != SCHEMA_VERSION {
                return Err(StoreError::SchemaVersionMismatch {
                    expected: SCHEMA_VERSION,
                    got: state.schema_version,
                });
            }
            (state, false)
        } else {
            (PersistedNotes::empty(), true)
        };

        if is_new {
            save(&path, &state)?;
        }

        debug!(path = %path.display(), notes = state.notes.len(), "opened note store");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NoteStore for JsonNoteStore {
    fn insert_note(&self, content: String) -> BoxFuture<'_, Result<NoteId, StoreError>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;

            let note = Note {
                id: new_ulid_string(),
                seq: state.next_seq,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                description: content,
            };
            let id = note.id.clone();

            let mut next = state.clone();
            next.next_seq = next.next_seq.saturating_add(1);
            next.notes.push(note);
            // Only publish the new collection once it is on disk.
            save(&self.path, &next)?;
            *state = next;

            Ok(id)
        })
    }

    fn fetch_all_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, StoreError>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut notes = state.notes.clone();
            notes.sort_by_key(|n| n.seq);
            Ok(notes)
        })
    }
}

fn save(path: &Path, state: &PersistedNotes) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(state)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Writes `bytes` next to `path`, fsyncs, then renames over `path`. Any
/// failure leaves the previous document untouched.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        ));
    };
    let tmp_path = dir.join(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
