//! Note edits repository implementation

use crate::error::Result;
use crate::models::{BoundingBox, LatLon, NoteEdit, NoteEditAction};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::conversion_failure;

/// `SQLite` limits bound parameters per statement to 999 by default.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

const SELECT_EDITS: &str = "SELECT id, note_id, latitude, longitude, action, text, image_paths,
        created, is_synced, images_need_activation
 FROM note_edits";

/// Trait for note edit storage operations
pub trait NoteEditsRepository {
    /// Store a new edit. The returned copy carries the assigned id.
    fn add(&self, edit: NoteEdit) -> Result<NoteEdit>;

    /// Get an edit by id
    fn get(&self, id: i64) -> Result<Option<NoteEdit>>;

    /// Delete an edit, returning whether it existed
    fn delete(&self, id: i64) -> Result<bool>;

    /// Delete the given edits, returning how many were removed
    fn delete_all(&self, ids: &[i64]) -> Result<usize>;

    /// All edits, oldest first
    fn get_all(&self) -> Result<Vec<NoteEdit>>;

    /// All unsynced edits, oldest first
    fn get_all_unsynced(&self) -> Result<Vec<NoteEdit>>;

    /// Unsynced edits of one note, oldest first
    fn get_all_unsynced_for_note(&self, note_id: i64) -> Result<Vec<NoteEdit>>;

    /// Unsynced edits of any of the given notes, oldest first
    fn get_all_unsynced_for_notes(&self, note_ids: &[i64]) -> Result<Vec<NoteEdit>>;

    /// Unsynced edits positioned inside `bbox`, oldest first
    fn get_all_unsynced_in(&self, bbox: &BoundingBox) -> Result<Vec<NoteEdit>>;

    /// Positions of the unsynced edits inside `bbox`, oldest first
    fn get_all_unsynced_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>>;

    /// The unsynced edit with the earliest timestamp
    fn get_oldest_unsynced(&self) -> Result<Option<NoteEdit>>;

    /// Number of unsynced edits
    fn get_unsynced_count(&self) -> Result<usize>;

    /// Synced edits created strictly before `timestamp`
    fn get_synced_older_than(&self, timestamp: i64) -> Result<Vec<NoteEdit>>;

    /// Mark an edit as uploaded
    fn mark_synced(&self, id: i64) -> Result<bool>;

    /// Delete synced edits created strictly before `timestamp`
    fn delete_synced_older_than(&self, timestamp: i64) -> Result<usize>;

    /// Point every edit of `old_note_id` at `new_note_id`
    fn update_note_id(&self, old_note_id: i64, new_note_id: i64) -> Result<usize>;

    /// The oldest synced edit whose photos still have to be activated
    fn get_oldest_needing_images_activation(&self) -> Result<Option<NoteEdit>>;

    /// Record that the photos of an edit have been activated
    fn mark_images_activated(&self, id: i64) -> Result<bool>;
}

/// `SQLite` implementation of `NoteEditsRepository`
pub struct SqliteNoteEditsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteEditsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse an edit from a row selected with `SELECT_EDITS`
    fn parse_edit(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteEdit> {
        let action: String = row.get(4)?;
        let image_paths: String = row.get(6)?;

        Ok(NoteEdit {
            id: row.get(0)?,
            note_id: row.get(1)?,
            position: LatLon::new(row.get(2)?, row.get(3)?),
            action: action
                .parse::<NoteEditAction>()
                .map_err(|e| conversion_failure(4, Type::Text, e))?,
            text: row.get(5)?,
            image_paths: serde_json::from_str(&image_paths)
                .map_err(|e| conversion_failure(6, Type::Text, e.into()))?,
            created_at: row.get(7)?,
            is_synced: row.get::<_, i32>(8)? != 0,
            images_need_activation: row.get::<_, i32>(9)? != 0,
        })
    }

    fn query_edits(&self, clause: &str, params: impl rusqlite::Params) -> Result<Vec<NoteEdit>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_EDITS} {clause}"))?;
        let edits = stmt
            .query_map(params, Self::parse_edit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edits)
    }

    fn query_edit(&self, clause: &str, params: impl rusqlite::Params) -> Result<Option<NoteEdit>> {
        let edit = self
            .conn
            .query_row(&format!("{SELECT_EDITS} {clause}"), params, Self::parse_edit)
            .optional()?;
        Ok(edit)
    }
}

/// `?, ?, ?` with `count` placeholders
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl NoteEditsRepository for SqliteNoteEditsRepository<'_> {
    fn add(&self, edit: NoteEdit) -> Result<NoteEdit> {
        let image_paths = serde_json::to_string(&edit.image_paths)?;

        self.conn.execute(
            "INSERT INTO note_edits (
                note_id, latitude, longitude, action, text, image_paths,
                created, is_synced, images_need_activation
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                edit.note_id,
                edit.position.latitude,
                edit.position.longitude,
                edit.action.as_str(),
                edit.text,
                image_paths,
                edit.created_at,
                i32::from(edit.is_synced),
                i32::from(edit.images_need_activation),
            ],
        )?;

        Ok(NoteEdit {
            id: self.conn.last_insert_rowid(),
            ..edit
        })
    }

    fn get(&self, id: i64) -> Result<Option<NoteEdit>> {
        self.query_edit("WHERE id = ?", params![id])
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM note_edits WHERE id = ?", params![id])?;
        Ok(rows == 1)
    }

    fn delete_all(&self, ids: &[i64]) -> Result<usize> {
        let mut deleted = 0;
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            deleted += self.conn.execute(
                &format!(
                    "DELETE FROM note_edits WHERE id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk),
            )?;
        }
        Ok(deleted)
    }

    fn get_all(&self) -> Result<Vec<NoteEdit>> {
        self.query_edits("ORDER BY created ASC, id ASC", [])
    }

    fn get_all_unsynced(&self) -> Result<Vec<NoteEdit>> {
        self.query_edits("WHERE is_synced = 0 ORDER BY created ASC, id ASC", [])
    }

    fn get_all_unsynced_for_note(&self, note_id: i64) -> Result<Vec<NoteEdit>> {
        self.query_edits(
            "WHERE is_synced = 0 AND note_id = ? ORDER BY created ASC, id ASC",
            params![note_id],
        )
    }

    fn get_all_unsynced_for_notes(&self, note_ids: &[i64]) -> Result<Vec<NoteEdit>> {
        let mut edits = Vec::new();
        for chunk in note_ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            edits.extend(self.query_edits(
                &format!(
                    "WHERE is_synced = 0 AND note_id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk),
            )?);
        }
        edits.sort_by_key(|edit| (edit.created_at, edit.id));
        Ok(edits)
    }

    fn get_all_unsynced_in(&self, bbox: &BoundingBox) -> Result<Vec<NoteEdit>> {
        self.query_edits(
            "WHERE is_synced = 0
               AND latitude BETWEEN ? AND ?
               AND longitude BETWEEN ? AND ?
             ORDER BY created ASC, id ASC",
            params![
                bbox.min_latitude,
                bbox.max_latitude,
                bbox.min_longitude,
                bbox.max_longitude
            ],
        )
    }

    fn get_all_unsynced_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>> {
        let mut stmt = self.conn.prepare(
            "SELECT latitude, longitude FROM note_edits
             WHERE is_synced = 0
               AND latitude BETWEEN ? AND ?
               AND longitude BETWEEN ? AND ?
             ORDER BY created ASC, id ASC",
        )?;

        let positions = stmt
            .query_map(
                params![
                    bbox.min_latitude,
                    bbox.max_latitude,
                    bbox.min_longitude,
                    bbox.max_longitude
                ],
                |row| Ok(LatLon::new(row.get(0)?, row.get(1)?)),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(positions)
    }

    fn get_oldest_unsynced(&self) -> Result<Option<NoteEdit>> {
        self.query_edit(
            "WHERE is_synced = 0 ORDER BY created ASC, id ASC LIMIT 1",
            [],
        )
    }

    fn get_unsynced_count(&self) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM note_edits WHERE is_synced = 0",
            [],
            |row| row.get::<_, usize>(0),
        )?;
        Ok(count)
    }

    fn get_synced_older_than(&self, timestamp: i64) -> Result<Vec<NoteEdit>> {
        self.query_edits(
            "WHERE is_synced = 1 AND created < ? ORDER BY created ASC, id ASC",
            params![timestamp],
        )
    }

    fn mark_synced(&self, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE note_edits SET is_synced = 1 WHERE id = ?",
            params![id],
        )?;
        Ok(rows == 1)
    }

    fn delete_synced_older_than(&self, timestamp: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM note_edits WHERE is_synced = 1 AND created < ?",
            params![timestamp],
        )?;
        Ok(rows)
    }

    fn update_note_id(&self, old_note_id: i64, new_note_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE note_edits SET note_id = ? WHERE note_id = ?",
            params![new_note_id, old_note_id],
        )?;
        Ok(rows)
    }

    fn get_oldest_needing_images_activation(&self) -> Result<Option<NoteEdit>> {
        self.query_edit(
            "WHERE is_synced = 1 AND images_need_activation = 1
             ORDER BY created ASC, id ASC LIMIT 1",
            [],
        )
    }

    fn mark_images_activated(&self, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE note_edits SET images_need_activation = 0 WHERE id = ?",
            params![id],
        )?;
        Ok(rows == 1)
    }
}
