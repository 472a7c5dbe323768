//! Locally recorded note edits waiting for upload

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::geo::LatLon;

/// What the user did to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoteEditAction {
    Create,
    Comment,
}

impl NoteEditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for NoteEditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteEditAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "COMMENT" => Ok(Self::Comment),
            other => Err(Error::InvalidInput(format!(
                "Unknown note edit action: {other}"
            ))),
        }
    }
}

/// A note edit made on this device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEdit {
    /// Row id, assigned when the edit is stored
    pub id: i64,
    /// Target note; negative while the note only exists locally
    pub note_id: i64,
    pub position: LatLon,
    pub action: NoteEditAction,
    pub text: String,
    /// Local paths of photos to attach on upload
    pub image_paths: Vec<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    pub is_synced: bool,
    /// Uploaded photos still have to be activated on the server
    pub images_need_activation: bool,
}

impl NoteEdit {
    /// Create an unsynced edit that has not been stored yet
    pub fn new(
        note_id: i64,
        action: NoteEditAction,
        position: LatLon,
        text: impl Into<String>,
        image_paths: Vec<String>,
        created_at: i64,
    ) -> Self {
        let images_need_activation = !image_paths.is_empty();
        Self {
            id: 0,
            note_id,
            position,
            action,
            text: text.into(),
            image_paths,
            created_at,
            is_synced: false,
            images_need_activation,
        }
    }

    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.image_paths.is_empty()
    }
}
