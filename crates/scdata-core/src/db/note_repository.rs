//! Note repository implementation

use crate::error::Result;
use crate::models::{BoundingBox, LatLon, Note, NoteStatus};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{conversion_failure, in_transaction};

/// `SQLite` limits bound parameters per statement to 999 by default.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Trait for storage of notes as last received from the server
pub trait NoteRepository {
    /// Insert or replace a note, recording when it was fetched
    fn put(&self, note: &Note, last_sync: i64) -> Result<()>;

    /// Insert or replace many notes at once
    fn put_all(&self, notes: &[Note], last_sync: i64) -> Result<()>;

    /// Get a note by id
    fn get(&self, id: i64) -> Result<Option<Note>>;

    /// Notes positioned inside `bbox`
    fn get_all_in(&self, bbox: &BoundingBox) -> Result<Vec<Note>>;

    /// Notes with the given ids, in no particular order
    fn get_all(&self, ids: &[i64]) -> Result<Vec<Note>>;

    /// Ids of the notes positioned inside `bbox`
    fn get_all_ids_in(&self, bbox: &BoundingBox) -> Result<Vec<i64>>;

    /// Positions of the notes inside `bbox`
    fn get_all_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>>;

    /// Ids of the notes last fetched strictly before `timestamp`
    fn get_ids_older_than(&self, timestamp: i64) -> Result<Vec<i64>>;

    /// Delete a note, returning whether it existed
    fn delete(&self, id: i64) -> Result<bool>;

    /// Delete the given notes, returning how many were removed
    fn delete_all(&self, ids: &[i64]) -> Result<usize>;
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from `id, latitude, longitude, status, created, closed, comments`
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let status: String = row.get(3)?;
        let comments: String = row.get(6)?;

        Ok(Note {
            id: row.get(0)?,
            position: LatLon::new(row.get(1)?, row.get(2)?),
            status: status
                .parse::<NoteStatus>()
                .map_err(|e| conversion_failure(3, Type::Text, e))?,
            created_at: row.get(4)?,
            closed_at: row.get(5)?,
            comments: serde_json::from_str(&comments)
                .map_err(|e| conversion_failure(6, Type::Text, e.into()))?,
        })
    }

    fn insert_or_replace(conn: &Connection, note: &Note, last_sync: i64) -> Result<()> {
        let comments = serde_json::to_string(&note.comments)?;
        conn.prepare_cached(
            "INSERT OR REPLACE INTO notes (
                id, latitude, longitude, status, created, closed, comments, last_sync
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?
        .execute(params![
            note.id,
            note.position.latitude,
            note.position.longitude,
            note.status.as_str(),
            note.created_at,
            note.closed_at,
            comments,
            last_sync,
        ])?;
        Ok(())
    }

    fn query_ids(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map(params, |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn put(&self, note: &Note, last_sync: i64) -> Result<()> {
        Self::insert_or_replace(self.conn, note, last_sync)
    }

    fn put_all(&self, notes: &[Note], last_sync: i64) -> Result<()> {
        if notes.is_empty() {
            return Ok(());
        }

        in_transaction(self.conn, |conn| {
            for note in notes {
                Self::insert_or_replace(conn, note, last_sync)?;
            }
            Ok(())
        })
    }

    fn get(&self, id: i64) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                "SELECT id, latitude, longitude, status, created, closed, comments
                 FROM notes WHERE id = ?",
                params![id],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn get_all_in(&self, bbox: &BoundingBox) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, latitude, longitude, status, created, closed, comments
             FROM notes
             WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?
             ORDER BY id",
        )?;

        let notes = stmt
            .query_map(
                params![
                    bbox.min_latitude,
                    bbox.max_latitude,
                    bbox.min_longitude,
                    bbox.max_longitude
                ],
                Self::parse_note,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    fn get_all(&self, ids: &[i64]) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, latitude, longitude, status, created, closed, comments
                 FROM notes WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let found = stmt
                .query_map(params_from_iter(chunk), Self::parse_note)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            notes.extend(found);
        }
        Ok(notes)
    }

    fn get_all_ids_in(&self, bbox: &BoundingBox) -> Result<Vec<i64>> {
        self.query_ids(
            "SELECT id FROM notes
             WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?",
            params![
                bbox.min_latitude,
                bbox.max_latitude,
                bbox.min_longitude,
                bbox.max_longitude
            ],
        )
    }

    fn get_all_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>> {
        let mut stmt = self.conn.prepare(
            "SELECT latitude, longitude FROM notes
             WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?",
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

    fn get_ids_older_than(&self, timestamp: i64) -> Result<Vec<i64>> {
        self.query_ids(
            "SELECT id FROM notes WHERE last_sync < ?",
            params![timestamp],
        )
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", params![id])?;
        Ok(rows == 1)
    }

    fn delete_all(&self, ids: &[i64]) -> Result<usize> {
        let mut deleted = 0;
        for chunk in ids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            deleted += self.conn.execute(
                &format!("DELETE FROM notes WHERE id IN ({})", placeholders(chunk.len())),
                params_from_iter(chunk),
            )?;
        }
        Ok(deleted)
    }
}
