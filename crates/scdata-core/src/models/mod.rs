//! Data models for scdata

mod element;
mod geo;
mod note;
mod note_edit;

pub use element::{ElementGeometry, ElementGeometryEntry, ElementKey, ElementType};
pub use geo::{BoundingBox, LatLon};
pub use note::{CommentAction, Note, NoteComment, NoteStatus, User};
pub use note_edit::{NoteEdit, NoteEditAction};
