//! Orchestrates note edits and notifies listeners

use std::sync::Arc;

use crate::db::{NoteEditsRepository, SqliteNoteEditsRepository};
use crate::listeners::{ListenerId, Listeners};
use crate::models::{BoundingBox, LatLon, Note, NoteEdit, NoteEditAction};
use crate::services::DatabaseService;
use crate::Result;

use super::{NoteEditsListener, NoteEditsSource};

/// Adds, syncs and deletes note edits.
///
/// Listeners are always notified after the database lock has been released.
pub struct NoteEditsController {
    db: DatabaseService,
    listeners: Listeners<dyn NoteEditsListener>,
}

impl NoteEditsController {
    pub const fn new(db: DatabaseService) -> Self {
        Self {
            db,
            listeners: Listeners::new(),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&SqliteNoteEditsRepository<'_>) -> Result<T>) -> Result<T> {
        self.db
            .with_connection(|conn| f(&SqliteNoteEditsRepository::new(conn)))
    }

    /// Record a new edit stamped with the current time
    pub fn add(
        &self,
        note_id: i64,
        action: NoteEditAction,
        position: LatLon,
        text: impl Into<String>,
        image_paths: Vec<String>,
    ) -> Result<NoteEdit> {
        let created_at = chrono::Utc::now().timestamp_millis();
        let edit = NoteEdit::new(note_id, action, position, text, image_paths, created_at);
        let edit = self.read(|repo| repo.add(edit))?;

        tracing::debug!(
            "Added {} edit {} for note {}",
            edit.action,
            edit.id,
            edit.note_id
        );
        self.listeners.notify(|listener| listener.on_added_edit(&edit));
        Ok(edit)
    }

    /// Record that `edit` was uploaded and resulted in `note`.
    ///
    /// When the server assigned a new id, every edit still pointing at the
    /// placeholder id is moved to the new one.
    pub fn synced(&self, edit: &NoteEdit, note: &Note) -> Result<()> {
        let marked = self.db.with_connection(|conn| {
            let tx = conn.unchecked_transaction()?;
            let repo = SqliteNoteEditsRepository::new(&tx);
            if edit.note_id != note.id {
                let moved = repo.update_note_id(edit.note_id, note.id)?;
                tracing::debug!(
                    "Moved {moved} edits from note {} to {}",
                    edit.note_id,
                    note.id
                );
            }
            let marked = repo.mark_synced(edit.id)?;
            tx.commit()?;
            Ok(marked)
        })?;

        if marked {
            self.listeners.notify(|listener| listener.on_synced_edit(edit));
        }
        Ok(())
    }

    /// Mark an edit synced by id, returning whether it exists
    pub fn mark_synced(&self, id: i64) -> Result<bool> {
        let edit = self.read(|repo| {
            let Some(edit) = repo.get(id)? else {
                return Ok(None);
            };
            repo.mark_synced(id)?;
            Ok(Some(edit))
        })?;

        match edit {
            Some(edit) => {
                self.listeners.notify(|listener| listener.on_synced_edit(&edit));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete an edit, returning whether it existed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.read(|repo| {
            let Some(edit) = repo.get(id)? else {
                return Ok(None);
            };
            repo.delete(id)?;
            Ok(Some(edit))
        })?;

        match deleted {
            Some(edit) => {
                tracing::debug!("Deleted edit {id} of note {}", edit.note_id);
                self.listeners
                    .notify(|listener| listener.on_deleted_edits(std::slice::from_ref(&edit)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Revert an edit the user no longer wants
    pub fn undo(&self, edit: &NoteEdit) -> Result<bool> {
        self.delete(edit.id)
    }

    /// Drop an edit the server refused
    pub fn sync_failed(&self, edit: &NoteEdit) -> Result<bool> {
        tracing::warn!("Dropping edit {} of note {} after failed upload", edit.id, edit.note_id);
        self.delete(edit.id)
    }

    /// Delete synced edits created strictly before `timestamp`
    pub fn delete_synced_older_than(&self, timestamp: i64) -> Result<usize> {
        let deleted = self.db.with_connection(|conn| {
            let tx = conn.unchecked_transaction()?;
            let repo = SqliteNoteEditsRepository::new(&tx);
            let edits = repo.get_synced_older_than(timestamp)?;
            let ids: Vec<i64> = edits.iter().map(|edit| edit.id).collect();
            repo.delete_all(&ids)?;
            tx.commit()?;
            Ok(edits)
        })?;

        if !deleted.is_empty() {
            tracing::debug!("Deleted {} synced edits", deleted.len());
            self.listeners
                .notify(|listener| listener.on_deleted_edits(&deleted));
        }
        Ok(deleted.len())
    }

    /// Point every edit of `old_note_id` at `new_note_id`
    pub fn update_note_id(&self, old_note_id: i64, new_note_id: i64) -> Result<usize> {
        self.read(|repo| repo.update_note_id(old_note_id, new_note_id))
    }

    pub fn get_all(&self) -> Result<Vec<NoteEdit>> {
        self.read(|repo| repo.get_all())
    }

    pub fn get_oldest_unsynced(&self) -> Result<Option<NoteEdit>> {
        self.read(|repo| repo.get_oldest_unsynced())
    }

    pub fn get_oldest_needing_images_activation(&self) -> Result<Option<NoteEdit>> {
        self.read(|repo| repo.get_oldest_needing_images_activation())
    }

    /// Record that the photos of an edit are now public
    pub fn images_activated(&self, id: i64) -> Result<bool> {
        self.read(|repo| repo.mark_images_activated(id))
    }
}

impl NoteEditsSource for NoteEditsController {
    fn get(&self, id: i64) -> Result<Option<NoteEdit>> {
        self.read(|repo| repo.get(id))
    }

    fn get_all_unsynced(&self) -> Result<Vec<NoteEdit>> {
        self.read(|repo| repo.get_all_unsynced())
    }

    fn get_all_unsynced_for_note(&self, note_id: i64) -> Result<Vec<NoteEdit>> {
        self.read(|repo| repo.get_all_unsynced_for_note(note_id))
    }

    fn get_all_unsynced_for_notes(&self, note_ids: &[i64]) -> Result<Vec<NoteEdit>> {
        self.read(|repo| repo.get_all_unsynced_for_notes(note_ids))
    }

    fn get_all_unsynced_in(&self, bbox: &BoundingBox) -> Result<Vec<NoteEdit>> {
        self.read(|repo| repo.get_all_unsynced_in(bbox))
    }

    fn get_all_unsynced_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>> {
        self.read(|repo| repo.get_all_unsynced_positions(bbox))
    }

    fn get_unsynced_count(&self) -> Result<usize> {
        self.read(|repo| repo.get_unsynced_count())
    }

    fn add_listener(&self, listener: Arc<dyn NoteEditsListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
