//! Notes as last downloaded from the server

mod controller;

pub use controller::NoteController;

use std::sync::Arc;

use crate::listeners::ListenerId;
use crate::models::{BoundingBox, LatLon, Note};
use crate::Result;

/// Observer of changes to the downloaded notes
pub trait NoteListener: Send + Sync {
    fn on_updated(&self, added: &[Note], updated: &[Note], deleted: &[i64]);
}

/// Read access to the downloaded notes plus change notifications
pub trait NoteSource: Send + Sync {
    fn get(&self, id: i64) -> Result<Option<Note>>;
    fn get_all(&self, bbox: &BoundingBox) -> Result<Vec<Note>>;
    fn get_all_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>>;

    fn add_listener(&self, listener: Arc<dyn NoteListener>) -> ListenerId;
    fn remove_listener(&self, id: ListenerId) -> bool;
}
