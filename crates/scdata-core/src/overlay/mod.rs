//! Notes as the user expects to see them: downloaded notes with the pending
//! local edits applied on top.
//!
//! [`NotesWithEditsSource`] listens to both the note source and the edit
//! source and re-emits every change as a merged added/updated/deleted
//! notification.

mod merge;

pub use merge::{apply_edits, IMAGES_PLACEHOLDER};

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Weak};

use crate::edits::{NoteEditsListener, NoteEditsSource};
use crate::listeners::{ListenerId, Listeners};
use crate::models::{BoundingBox, LatLon, Note, NoteEdit};
use crate::notes::{NoteListener, NoteSource};
use crate::user::UserIdentity;
use crate::Result;

/// Observer of the merged notes
pub trait NotesWithEditsListener: Send + Sync {
    fn on_updated(&self, added: &[Note], updated: &[Note], deleted: &[i64]);
}

/// Merged view of downloaded notes and pending note edits
pub struct NotesWithEditsSource {
    notes: Arc<dyn NoteSource>,
    edits: Arc<dyn NoteEditsSource>,
    user: Arc<dyn UserIdentity>,
    listeners: Listeners<dyn NotesWithEditsListener>,
    note_listener: ListenerId,
    edits_listener: ListenerId,
}

impl NotesWithEditsSource {
    /// Create the merged view and subscribe it to both sources.
    ///
    /// The subscriptions hold only a weak reference and are removed again
    /// when the returned value is dropped.
    pub fn new(
        notes: Arc<dyn NoteSource>,
        edits: Arc<dyn NoteEditsSource>,
        user: Arc<dyn UserIdentity>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let note_listener = notes.add_listener(Arc::new(NoteRelay(weak.clone())));
            let edits_listener = edits.add_listener(Arc::new(EditsRelay(weak.clone())));
            Self {
                notes,
                edits,
                user,
                listeners: Listeners::new(),
                note_listener,
                edits_listener,
            }
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn NotesWithEditsListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// The note with the given id including pending edits
    pub fn get(&self, id: i64) -> Result<Option<Note>> {
        let note = self.notes.get(id)?;
        let edits = self.edits.get_all_unsynced_for_note(id)?;
        self.merge(note, &edits)
    }

    /// All notes inside `bbox`, including notes that so far only exist locally
    pub fn get_all(&self, bbox: &BoundingBox) -> Result<Vec<Note>> {
        let notes = self.notes.get_all(bbox)?;
        let note_ids: Vec<i64> = notes.iter().map(|note| note.id).collect();
        let mut edits_by_note = group_by_note(self.edits.get_all_unsynced_for_notes(&note_ids)?);

        let mut result = Vec::with_capacity(notes.len());
        for note in notes {
            let edits = edits_by_note.remove(&note.id).unwrap_or_default();
            if let Some(note) = self.merge(Some(note), &edits)? {
                result.push(note);
            }
        }

        let known: HashSet<i64> = note_ids.into_iter().collect();
        let edit_only_ids: Vec<i64> = group_by_note(self.edits.get_all_unsynced_in(bbox)?)
            .into_keys()
            .filter(|id| !known.contains(id))
            .collect();
        for id in edit_only_ids {
            if let Some(note) = self.get(id)? {
                result.push(note);
            }
        }

        Ok(result)
    }

    /// Positions of all notes and pending edits inside `bbox`, unmerged
    pub fn get_all_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>> {
        let mut positions = self.notes.get_all_positions(bbox)?;
        positions.extend(self.edits.get_all_unsynced_positions(bbox)?);
        Ok(positions)
    }

    fn merge(&self, note: Option<Note>, edits: &[NoteEdit]) -> Result<Option<Note>> {
        if edits.is_empty() {
            return Ok(note);
        }
        let user = self.user.current_user()?;
        apply_edits(note, edits, user.as_ref())
    }

    fn notify(&self, added: &[Note], updated: &[Note], deleted: &[i64]) {
        if added.is_empty() && updated.is_empty() && deleted.is_empty() {
            return;
        }
        self.listeners
            .notify(|listener| listener.on_updated(added, updated, deleted));
    }

    fn on_notes_updated(&self, added: &[Note], updated: &[Note], deleted: &[i64]) -> Result<()> {
        let ids: Vec<i64> = added.iter().chain(updated).map(|note| note.id).collect();
        let mut edits_by_note = if ids.is_empty() {
            BTreeMap::new()
        } else {
            group_by_note(self.edits.get_all_unsynced_for_notes(&ids)?)
        };

        let mut overlay = |notes: &[Note]| -> Result<Vec<Note>> {
            let mut merged = Vec::with_capacity(notes.len());
            for note in notes {
                let edits = edits_by_note.remove(&note.id).unwrap_or_default();
                if let Some(note) = self.merge(Some(note.clone()), &edits)? {
                    merged.push(note);
                }
            }
            Ok(merged)
        };
        let added = overlay(added)?;
        let updated = overlay(updated)?;

        self.notify(&added, &updated, deleted);
        Ok(())
    }

    fn on_added_edit(&self, edit: &NoteEdit) -> Result<()> {
        let note = self.notes.get(edit.note_id)?;
        let exists = note.is_some();
        let edits = self.edits.get_all_unsynced_for_note(edit.note_id)?;
        let Some(merged) = self.merge(note, &edits)? else {
            return Ok(());
        };

        if exists {
            self.notify(&[], &[merged], &[]);
        } else {
            self.notify(&[merged], &[], &[]);
        }
        Ok(())
    }

    /// Recompute the given notes after edits of them went away
    fn on_edits_removed(&self, note_ids: impl IntoIterator<Item = i64>) -> Result<()> {
        let mut updated = Vec::new();
        let mut deleted = Vec::new();
        let mut seen = HashSet::new();
        for id in note_ids {
            if !seen.insert(id) {
                continue;
            }
            match self.get(id)? {
                Some(note) => updated.push(note),
                None => deleted.push(id),
            }
        }

        self.notify(&[], &updated, &deleted);
        Ok(())
    }

    fn on_deleted_edits(&self, edits: &[NoteEdit]) -> Result<()> {
        self.on_edits_removed(
            edits
                .iter()
                .filter(|edit| !edit.is_synced)
                .map(|edit| edit.note_id),
        )
    }

    fn on_synced_edit(&self, edit: &NoteEdit) -> Result<()> {
        self.on_edits_removed([edit.note_id])
    }
}

impl Drop for NotesWithEditsSource {
    fn drop(&mut self) {
        self.notes.remove_listener(self.note_listener);
        self.edits.remove_listener(self.edits_listener);
    }
}

fn group_by_note(edits: Vec<NoteEdit>) -> BTreeMap<i64, Vec<NoteEdit>> {
    let mut grouped: BTreeMap<i64, Vec<NoteEdit>> = BTreeMap::new();
    for edit in edits {
        grouped.entry(edit.note_id).or_default().push(edit);
    }
    grouped
}

fn log_failure(event: &str, result: Result<()>) {
    if let Err(error) = result {
        tracing::error!("Failed to update merged notes after {event}: {error}");
    }
}

struct NoteRelay(Weak<NotesWithEditsSource>);

impl NoteListener for NoteRelay {
    fn on_updated(&self, added: &[Note], updated: &[Note], deleted: &[i64]) {
        if let Some(source) = self.0.upgrade() {
            log_failure(
                "note update",
                source.on_notes_updated(added, updated, deleted),
            );
        }
    }
}

struct EditsRelay(Weak<NotesWithEditsSource>);

impl NoteEditsListener for EditsRelay {
    fn on_added_edit(&self, edit: &NoteEdit) {
        if let Some(source) = self.0.upgrade() {
            log_failure("added edit", source.on_added_edit(edit));
        }
    }

    fn on_synced_edit(&self, edit: &NoteEdit) {
        if let Some(source) = self.0.upgrade() {
            log_failure("synced edit", source.on_synced_edit(edit));
        }
    }

    fn on_deleted_edits(&self, edits: &[NoteEdit]) {
        if let Some(source) = self.0.upgrade() {
            log_failure("deleted edits", source.on_deleted_edits(edits));
        }
    }
}
