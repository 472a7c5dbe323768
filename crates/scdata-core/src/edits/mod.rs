//! Locally created note edits awaiting upload

mod controller;

pub use controller::NoteEditsController;

use std::sync::Arc;

use crate::listeners::ListenerId;
use crate::models::{BoundingBox, LatLon, NoteEdit};
use crate::Result;

/// Observer of changes to the stored note edits
pub trait NoteEditsListener: Send + Sync {
    fn on_added_edit(&self, edit: &NoteEdit);
    /// Called with the edit as it was before being marked synced
    fn on_synced_edit(&self, edit: &NoteEdit);
    fn on_deleted_edits(&self, edits: &[NoteEdit]);
}

/// Read access to the pending note edits plus change notifications
pub trait NoteEditsSource: Send + Sync {
    fn get(&self, id: i64) -> Result<Option<NoteEdit>>;
    fn get_all_unsynced(&self) -> Result<Vec<NoteEdit>>;
    fn get_all_unsynced_for_note(&self, note_id: i64) -> Result<Vec<NoteEdit>>;
    fn get_all_unsynced_for_notes(&self, note_ids: &[i64]) -> Result<Vec<NoteEdit>>;
    fn get_all_unsynced_in(&self, bbox: &BoundingBox) -> Result<Vec<NoteEdit>>;
    fn get_all_unsynced_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>>;
    fn get_unsynced_count(&self) -> Result<usize>;

    fn add_listener(&self, listener: Arc<dyn NoteEditsListener>) -> ListenerId;
    fn remove_listener(&self, id: ListenerId) -> bool;
}
