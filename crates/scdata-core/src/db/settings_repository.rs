//! Settings repository implementation

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for key/value settings storage
pub trait SettingsRepository {
    /// Read a setting, `None` when it was never stored
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a setting, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a setting, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?", params![key])?;
        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_missing_setting() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        assert_eq!(repo.get("user.id").unwrap(), None);
        assert!(!repo.remove("user.id").unwrap());
    }

    #[test]
    fn test_set_replace_remove() {
        let db = setup();
        let repo = SqliteSettingsRepository::new(db.connection());

        repo.set("user.name", "alice").unwrap();
        repo.set("user.name", "bob").unwrap();
        assert_eq!(repo.get("user.name").unwrap().as_deref(), Some("bob"));

        assert!(repo.remove("user.name").unwrap());
        assert_eq!(repo.get("user.name").unwrap(), None);
    }
}
