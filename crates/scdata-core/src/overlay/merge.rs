//! Applying pending edits on top of a note

use crate::models::{CommentAction, Note, NoteComment, NoteEdit, NoteEditAction, NoteStatus, User};
use crate::{Error, Result};

/// Appended to the text of comments whose photos are not uploaded yet
pub const IMAGES_PLACEHOLDER: &str = "\n\n(Photo(s) will be attached on upload)";

/// Merge `edits` into `note`.
///
/// Edits are applied oldest first as additional comments authored by `user`.
/// When there is no authoritative note the edits must start with the one that
/// created it, otherwise the pending data is inconsistent and an
/// [`Error::Invariant`] is returned.
pub fn apply_edits(
    note: Option<Note>,
    edits: &[NoteEdit],
    user: Option<&User>,
) -> Result<Option<Note>> {
    let mut edits: Vec<&NoteEdit> = edits.iter().collect();
    edits.sort_by_key(|edit| (edit.created_at, edit.id));

    let Some(first) = edits.first() else {
        return Ok(note);
    };

    let mut note = match note {
        Some(note) => note,
        None if first.action == NoteEditAction::Create => Note {
            id: first.note_id,
            position: first.position,
            status: NoteStatus::Open,
            created_at: first.created_at,
            closed_at: None,
            comments: Vec::new(),
        },
        None => {
            tracing::error!(
                "Note {} only exists locally but its first edit {} does not create it",
                first.note_id,
                first.id
            );
            return Err(Error::Invariant(format!(
                "first edit of local note {} is a {}, expected {}",
                first.note_id,
                first.action,
                NoteEditAction::Create
            )));
        }
    };

    note.comments
        .extend(edits.into_iter().map(|edit| to_comment(edit, user)));
    Ok(Some(note))
}

fn to_comment(edit: &NoteEdit, user: Option<&User>) -> NoteComment {
    let mut text = edit.text.clone();
    if edit.has_images() {
        text.push_str(IMAGES_PLACEHOLDER);
    }
    let action = match edit.action {
        NoteEditAction::Create => CommentAction::Opened,
        NoteEditAction::Comment => CommentAction::Commented,
    };
    NoteComment {
        text,
        action,
        timestamp: edit.created_at,
        user: user.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLon;
    use pretty_assertions::assert_eq;

    fn comment(text: &str, action: CommentAction, timestamp: i64) -> NoteComment {
        NoteComment {
            text: text.to_string(),
            action,
            timestamp,
            user: None,
        }
    }

    fn note(id: i64, comments: Vec<NoteComment>) -> Note {
        Note {
            id,
            position: LatLon::new(0.0, 0.0),
            status: NoteStatus::Open,
            created_at: 123,
            closed_at: None,
            comments,
        }
    }

    fn edit(note_id: i64, action: NoteEditAction, text: &str, timestamp: i64) -> NoteEdit {
        NoteEdit {
            id: timestamp,
            ..NoteEdit::new(
                note_id,
                action,
                LatLon::new(12.0, 46.0),
                text,
                Vec::new(),
                timestamp,
            )
        }
    }

    #[test]
    fn test_no_edits_returns_note_unchanged() {
        let original = note(1, vec![comment("test", CommentAction::Opened, 100)]);
        assert_eq!(
            apply_edits(Some(original.clone()), &[], None).unwrap(),
            Some(original)
        );
        assert_eq!(apply_edits(None, &[], None).unwrap(), None);
    }

    #[test]
    fn test_comment_by_anonymous_user() {
        let original = note(1, vec![comment("test", CommentAction::Opened, 100)]);
        let edits = [edit(1, NoteEditAction::Comment, "test2", 500)];

        let merged = apply_edits(Some(original), &edits, None).unwrap().unwrap();

        assert_eq!(
            merged.comments,
            vec![
                comment("test", CommentAction::Opened, 100),
                comment("test2", CommentAction::Commented, 500),
            ]
        );
    }

    #[test]
    fn test_comment_by_logged_in_user() {
        let original = note(1, vec![comment("test", CommentAction::Opened, 123)]);
        let edits = [edit(1, NoteEditAction::Comment, "test2", 500)];
        let user = User::new(23, "test user");

        let merged = apply_edits(Some(original), &edits, Some(&user))
            .unwrap()
            .unwrap();

        assert_eq!(merged.comments[0].user, None);
        assert_eq!(merged.comments[1].user, Some(user));
    }

    #[test]
    fn test_images_placeholder() {
        let original = note(1, vec![comment("test", CommentAction::Opened, 123)]);
        let edits = [NoteEdit {
            image_paths: vec!["something".to_string()],
            ..edit(1, NoteEditAction::Comment, "test2", 500)
        }];

        let merged = apply_edits(Some(original), &edits, None).unwrap().unwrap();

        assert_eq!(
            merged.comments[1].text,
            "test2\n\n(Photo(s) will be attached on upload)"
        );
    }

    #[test]
    fn test_edits_applied_in_timestamp_order() {
        let original = note(1, vec![comment("test", CommentAction::Opened, 123)]);
        let edits = [
            edit(1, NoteEditAction::Comment, "test3", 800),
            edit(1, NoteEditAction::Comment, "test2", 500),
        ];

        let merged = apply_edits(Some(original), &edits, None).unwrap().unwrap();

        let texts: Vec<&str> = merged.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["test", "test2", "test3"]);
    }

    #[test]
    fn test_created_then_commented() {
        let edits = [
            edit(-12, NoteEditAction::Create, "test12", 123),
            edit(-12, NoteEditAction::Comment, "test34", 234),
        ];

        let merged = apply_edits(None, &edits, None).unwrap().unwrap();

        assert_eq!(
            merged,
            Note {
                id: -12,
                position: LatLon::new(12.0, 46.0),
                status: NoteStatus::Open,
                created_at: 123,
                closed_at: None,
                comments: vec![
                    comment("test12", CommentAction::Opened, 123),
                    comment("test34", CommentAction::Commented, 234),
                ],
            }
        );
    }

    #[test]
    fn test_local_note_without_create_is_rejected() {
        let edits = [edit(-3, NoteEditAction::Comment, "orphan", 100)];

        let err = apply_edits(None, &edits, None).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }
}
