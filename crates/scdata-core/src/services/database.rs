//! Shared database service wrapper used by every controller.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::{
    Database, ElementGeometryRepository, SettingsRepository, SqliteElementGeometryRepository,
    SqliteSettingsRepository,
};
use crate::models::{ElementGeometry, ElementGeometryEntry, ElementKey, ElementType};
use crate::{Error, Result};

/// Thread-safe handle to the single database connection.
///
/// Every repository call goes through [`DatabaseService::with_connection`],
/// which holds the lock for the duration of the closure only.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub fn open_path(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        tracing::info!("Using database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| Error::Database("database lock poisoned".to_string()))?;
        f(db.connection())
    }

    /// Store the geometry of an element.
    pub fn put_geometry(&self, entry: &ElementGeometryEntry) -> Result<()> {
        self.with_connection(|conn| SqliteElementGeometryRepository::new(conn).put(entry))
    }

    /// Store many geometries in one transaction.
    pub fn put_all_geometries(&self, entries: &[ElementGeometryEntry]) -> Result<()> {
        self.with_connection(|conn| SqliteElementGeometryRepository::new(conn).put_all(entries))
    }

    /// Fetch the geometry of one element.
    pub fn get_geometry(
        &self,
        element_type: ElementType,
        element_id: i64,
    ) -> Result<Option<ElementGeometry>> {
        self.with_connection(|conn| {
            SqliteElementGeometryRepository::new(conn).get(element_type, element_id)
        })
    }

    /// Fetch the stored subset of the given elements.
    pub fn get_all_geometries(&self, keys: &[ElementKey]) -> Result<Vec<ElementGeometryEntry>> {
        self.with_connection(|conn| {
            SqliteElementGeometryRepository::new(conn).get_all_entries(keys)
        })
    }

    /// List every element that has a stored geometry.
    pub fn get_all_geometry_keys(&self) -> Result<Vec<ElementKey>> {
        self.with_connection(|conn| SqliteElementGeometryRepository::new(conn).get_all_keys())
    }

    /// Delete the geometry of one element.
    pub fn delete_geometry(&self, element_type: ElementType, element_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            SqliteElementGeometryRepository::new(conn).delete(element_type, element_id)
        })
    }

    /// Delete the geometry of many elements, returning how many were stored.
    pub fn delete_all_geometries(&self, keys: &[ElementKey]) -> Result<usize> {
        self.with_connection(|conn| SqliteElementGeometryRepository::new(conn).delete_all(keys))
    }

    /// Read a setting.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| SqliteSettingsRepository::new(conn).get(key))
    }

    /// Remove a setting.
    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| SqliteSettingsRepository::new(conn).remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLon;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn in_memory_geometry_roundtrip() {
        let service = DatabaseService::open_in_memory().unwrap();
        let entry = ElementGeometryEntry::new(
            ElementType::Node,
            7,
            ElementGeometry::Point {
                center: LatLon::new(1.0, 2.0),
            },
        );

        service.put_geometry(&entry).unwrap();

        assert_eq!(
            service.get_geometry(ElementType::Node, 7).unwrap(),
            Some(entry.geometry.clone())
        );
        assert_eq!(service.get_all_geometry_keys().unwrap(), vec![entry.key()]);
        assert!(service.delete_geometry(ElementType::Node, 7).unwrap());
    }

    fn put_setting(service: &DatabaseService, key: &str, value: &str) {
        service
            .with_connection(|conn| SqliteSettingsRepository::new(conn).set(key, value))
            .unwrap();
    }

    #[test]
    fn file_backed_service_persists_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("scdata.db");

        {
            let service = DatabaseService::open_path(&path).unwrap();
            put_setting(&service, "user.name", "alice");
        }

        let service = DatabaseService::open_path(&path).unwrap();
        assert_eq!(
            service.get_setting("user.name").unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn clones_share_one_connection() {
        let service = DatabaseService::open_in_memory().unwrap();
        let other = service.clone();

        put_setting(&service, "k", "v");
        assert_eq!(other.get_setting("k").unwrap().as_deref(), Some("v"));
        assert!(other.remove_setting("k").unwrap());
    }
}
