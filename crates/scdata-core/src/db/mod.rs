//! Database layer for scdata

mod connection;
mod geometry_repository;
mod migrations;
mod note_edits_repository;
mod note_repository;
mod polylines;
mod settings_repository;

pub use connection::Database;
pub use geometry_repository::{ElementGeometryRepository, SqliteElementGeometryRepository};
pub use note_edits_repository::{NoteEditsRepository, SqliteNoteEditsRepository};
pub use note_repository::{NoteRepository, SqliteNoteRepository};
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};

/// Wrap a column decoding failure so it can be returned from a row mapper
fn conversion_failure(
    column: usize,
    column_type: rusqlite::types::Type,
    error: crate::Error,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, column_type, Box::new(error))
}

/// Run `f` atomically on `conn`.
///
/// Opens a transaction unless one is already open on the connection, in which
/// case `f` runs as part of the caller's transaction and the caller commits.
fn in_transaction<T>(
    conn: &rusqlite::Connection,
    f: impl FnOnce(&rusqlite::Connection) -> crate::Result<T>,
) -> crate::Result<T> {
    if !conn.is_autocommit() {
        return f(conn);
    }

    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
