//! Note model, as delivered by the notes service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::geo::LatLon;

/// Lifecycle state of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoteStatus {
    #[default]
    Open,
    Closed,
    Hidden,
}

impl NoteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Hidden => "HIDDEN",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "HIDDEN" => Ok(Self::Hidden),
            other => Err(Error::InvalidInput(format!("Unknown note status: {other}"))),
        }
    }
}

/// What a comment did to its note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentAction {
    Opened,
    Commented,
    Closed,
    Reopened,
    Hidden,
}

/// Author of a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
}

impl User {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// A single comment of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteComment {
    pub text: String,
    pub action: CommentAction,
    /// Creation timestamp (Unix ms)
    pub timestamp: i64,
    /// `None` for anonymous comments
    #[serde(default)]
    pub user: Option<User>,
}

/// A note on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Server id, or a negative placeholder for notes only known locally
    pub id: i64,
    pub position: LatLon,
    pub status: NoteStatus,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Closing timestamp (Unix ms)
    #[serde(default)]
    pub closed_at: Option<i64>,
    /// Comments in chronological order
    pub comments: Vec<NoteComment>,
}

impl Note {
    /// Text of the opening comment, if any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.comments
            .iter()
            .find(|comment| comment.action == CommentAction::Opened)
            .map(|comment| comment.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_status_parse() {
        assert_eq!("OPEN".parse::<NoteStatus>().unwrap(), NoteStatus::Open);
        assert_eq!("CLOSED".parse::<NoteStatus>().unwrap(), NoteStatus::Closed);
        assert!("open".parse::<NoteStatus>().is_err());
    }

    #[test]
    fn test_description_uses_opening_comment() {
        let note = Note {
            id: 1,
            position: LatLon::new(0.0, 0.0),
            status: NoteStatus::Open,
            created_at: 100,
            closed_at: None,
            comments: vec![
                NoteComment {
                    text: "a bench is missing".to_string(),
                    action: CommentAction::Opened,
                    timestamp: 100,
                    user: None,
                },
                NoteComment {
                    text: "still missing".to_string(),
                    action: CommentAction::Commented,
                    timestamp: 200,
                    user: Some(User::new(7, "mapper")),
                },
            ],
        };

        assert_eq!(note.description(), Some("a bench is missing"));
    }

    #[test]
    fn test_comment_json_without_user() {
        let comment: NoteComment =
            serde_json::from_str(r#"{"text":"hi","action":"COMMENTED","timestamp":5}"#).unwrap();
        assert_eq!(comment.user, None);
        assert_eq!(comment.action, CommentAction::Commented);
    }
}
