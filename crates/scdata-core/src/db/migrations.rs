//! Database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version)
}

/// Migration to version 1: element geometry, notes and settings
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS element_geometry (
            element_type TEXT NOT NULL,
            element_id INTEGER NOT NULL,
            geometry_polylines BLOB,
            geometry_polygons BLOB,
            center_latitude REAL NOT NULL,
            center_longitude REAL NOT NULL,
            CHECK (geometry_polylines IS NULL OR geometry_polygons IS NULL),
            PRIMARY KEY (element_type, element_id)
        );
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            status TEXT NOT NULL,
            created INTEGER NOT NULL,
            closed INTEGER,
            comments TEXT NOT NULL,
            last_sync INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notes_position ON notes(latitude, longitude);
        CREATE INDEX IF NOT EXISTS idx_notes_last_sync ON notes(last_sync);
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: locally pending note edits
fn migrate_v2(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS note_edits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            note_id INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            action TEXT NOT NULL,
            text TEXT NOT NULL,
            image_paths TEXT NOT NULL,
            created INTEGER NOT NULL,
            is_synced INTEGER NOT NULL DEFAULT 0,
            images_need_activation INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_note_edits_note_id ON note_edits(note_id);
        CREATE INDEX IF NOT EXISTS idx_note_edits_position ON note_edits(latitude, longitude);
        CREATE INDEX IF NOT EXISTS idx_note_edits_created ON note_edits(created);
        INSERT INTO schema_version (version) VALUES (2);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
