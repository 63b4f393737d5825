use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use super::{BoxFuture, Note, NoteId, NoteStore, StoreError};
use crate::id::new_ulid_string;

#[derive(Default)]
pub struct MemoryNoteStore {
    notes: Mutex<Vec<Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for MemoryNoteStore {
    fn insert_note(&self, content: String) -> BoxFuture<'_, Result<NoteId, StoreError>> {
        Box::pin(async move {
            let mut notes = self.notes.lock().await;
            let seq = notes.last().map(|n| n.seq + 1).unwrap_or(1);
            let note = Note {
                id: new_ulid_string(),
                seq,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                description: content,
            };
            let id = note.id.clone();
            notes.push(note);
            Ok(id)
        })
    }

    fn fetch_all_notes(&self) -> BoxFuture<'_, Result<Vec<Note>, StoreError>> {
        Box::pin(async move { Ok(self.notes.lock().await.clone()) })
    }
}
