//! Element geometry repository implementation

use crate::error::Result;
use crate::models::{ElementGeometry, ElementGeometryEntry, ElementKey, ElementType, LatLon};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{conversion_failure, in_transaction, polylines};

/// Trait for element geometry storage operations
pub trait ElementGeometryRepository {
    /// Insert or replace the geometry of one element
    fn put(&self, entry: &ElementGeometryEntry) -> Result<()>;

    /// Get the geometry of an element
    fn get(&self, element_type: ElementType, element_id: i64) -> Result<Option<ElementGeometry>>;

    /// Insert or replace many geometries at once
    fn put_all(&self, entries: &[ElementGeometryEntry]) -> Result<()>;

    /// Get the stored entries for exactly the given keys, in no particular order
    fn get_all_entries(&self, keys: &[ElementKey]) -> Result<Vec<ElementGeometryEntry>>;

    /// Keys of every stored geometry
    fn get_all_keys(&self) -> Result<Vec<ElementKey>>;

    /// Delete the geometry of an element, returning whether a row was removed
    fn delete(&self, element_type: ElementType, element_id: i64) -> Result<bool>;

    /// Delete the geometry of many elements, returning how many were removed
    fn delete_all(&self, keys: &[ElementKey]) -> Result<usize>;
}

/// `SQLite` implementation of `ElementGeometryRepository`
pub struct SqliteElementGeometryRepository<'a> {
    conn: &'a Connection,
}

/// Column values of a geometry row. At most one payload is set.
struct GeometryColumns {
    polylines: Option<Vec<u8>>,
    polygons: Option<Vec<u8>>,
    center: LatLon,
}

impl<'a> SqliteElementGeometryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn to_columns(geometry: &ElementGeometry) -> Result<GeometryColumns> {
        Ok(match geometry {
            ElementGeometry::Point { center } => GeometryColumns {
                polylines: None,
                polygons: None,
                center: *center,
            },
            ElementGeometry::Polylines { polylines, center } => GeometryColumns {
                polylines: Some(polylines::serialize(polylines)?),
                polygons: None,
                center: *center,
            },
            ElementGeometry::Polygons { polygons, center } => GeometryColumns {
                polylines: None,
                polygons: Some(polylines::serialize(polygons)?),
                center: *center,
            },
        })
    }

    /// Parse a geometry from the columns
    /// `geometry_polylines, geometry_polygons, center_latitude, center_longitude`
    /// starting at `offset`
    fn parse_geometry(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<ElementGeometry> {
        let polylines: Option<Vec<u8>> = row.get(offset)?;
        let polygons: Option<Vec<u8>> = row.get(offset + 1)?;
        let center = LatLon::new(row.get(offset + 2)?, row.get(offset + 3)?);

        let decode = |column: usize, bytes: &[u8]| {
            polylines::deserialize(bytes).map_err(|e| conversion_failure(column, Type::Blob, e))
        };

        Ok(match (polygons, polylines) {
            (Some(bytes), _) => ElementGeometry::Polygons {
                polygons: decode(offset + 1, &bytes)?,
                center,
            },
            (None, Some(bytes)) => ElementGeometry::Polylines {
                polylines: decode(offset, &bytes)?,
                center,
            },
            (None, None) => ElementGeometry::Point { center },
        })
    }

    fn parse_element_type(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<ElementType> {
        let element_type: String = row.get(column)?;
        element_type
            .parse()
            .map_err(|e| conversion_failure(column, Type::Text, e))
    }

    /// Parse a full entry from `element_type, element_id, <geometry columns>`
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ElementGeometryEntry> {
        Ok(ElementGeometryEntry {
            element_type: Self::parse_element_type(row, 0)?,
            element_id: row.get(1)?,
            geometry: Self::parse_geometry(row, 2)?,
        })
    }

    fn insert_or_replace(conn: &Connection, entry: &ElementGeometryEntry) -> Result<()> {
        let columns = Self::to_columns(&entry.geometry)?;
        conn.prepare_cached(
            "INSERT OR REPLACE INTO element_geometry (
                element_type, element_id, geometry_polylines, geometry_polygons,
                center_latitude, center_longitude
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )?
        .execute(params![
            entry.element_type.as_str(),
            entry.element_id,
            columns.polylines,
            columns.polygons,
            columns.center.latitude,
            columns.center.longitude,
        ])?;
        Ok(())
    }
}

impl ElementGeometryRepository for SqliteElementGeometryRepository<'_> {
    fn put(&self, entry: &ElementGeometryEntry) -> Result<()> {
        Self::insert_or_replace(self.conn, entry)
    }

    fn get(&self, element_type: ElementType, element_id: i64) -> Result<Option<ElementGeometry>> {
        let geometry = self
            .conn
            .query_row(
                "SELECT geometry_polylines, geometry_polygons, center_latitude, center_longitude
                 FROM element_geometry
                 WHERE element_type = ? AND element_id = ?",
                params![element_type.as_str(), element_id],
                |row| Self::parse_geometry(row, 0),
            )
            .optional()?;

        Ok(geometry)
    }

    fn put_all(&self, entries: &[ElementGeometryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        in_transaction(self.conn, |conn| {
            for entry in entries {
                Self::insert_or_replace(conn, entry)?;
            }
            Ok(())
        })?;

        tracing::debug!("Stored {} element geometries", entries.len());
        Ok(())
    }

    fn get_all_entries(&self, keys: &[ElementKey]) -> Result<Vec<ElementGeometryEntry>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no `(a, b) IN ((1, 2), (3, 4))`, so the keys go into a
        // temporary table that is joined and dropped again inside one
        // transaction. Temporary tables are private to this connection.
        in_transaction(self.conn, |conn| {
            conn.execute_batch(
                "CREATE TEMPORARY TABLE element_geometry_lookup (
                    element_type TEXT NOT NULL,
                    element_id INTEGER NOT NULL,
                    PRIMARY KEY (element_type, element_id)
                )",
            )?;

            {
                let mut insert = conn.prepare(
                    "INSERT OR IGNORE INTO element_geometry_lookup (element_type, element_id)
                     VALUES (?, ?)",
                )?;
                for key in keys {
                    insert.execute(params![key.element_type.as_str(), key.element_id])?;
                }
            }

            let mut stmt = conn.prepare(
                "SELECT g.element_type, g.element_id, g.geometry_polylines, g.geometry_polygons,
                        g.center_latitude, g.center_longitude
                 FROM element_geometry g
                 JOIN element_geometry_lookup l
                   ON g.element_type = l.element_type AND g.element_id = l.element_id",
            )?;
            let entries = stmt
                .query_map([], Self::parse_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);

            conn.execute_batch("DROP TABLE element_geometry_lookup")?;
            Ok(entries)
        })
    }

    fn get_all_keys(&self) -> Result<Vec<ElementKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT element_type, element_id FROM element_geometry
             ORDER BY element_type, element_id",
        )?;

        let keys = stmt
            .query_map([], |row| {
                Ok(ElementKey::new(
                    Self::parse_element_type(row, 0)?,
                    row.get(1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(keys)
    }

    fn delete(&self, element_type: ElementType, element_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM element_geometry WHERE element_type = ? AND element_id = ?",
            params![element_type.as_str(), element_id],
        )?;
        Ok(rows == 1)
    }

    fn delete_all(&self, keys: &[ElementKey]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        in_transaction(self.conn, |conn| {
            let mut stmt = conn.prepare(
                "DELETE FROM element_geometry WHERE element_type = ? AND element_id = ?",
            )?;
            let mut deleted = 0;
            for key in keys {
                deleted += stmt.execute(params![key.element_type.as_str(), key.element_id])?;
            }
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn simple_geometry() -> ElementGeometry {
        ElementGeometry::Point {
            center: LatLon::new(50.0, 50.0),
        }
    }

    fn some_lat_lons(start: f64) -> Vec<LatLon> {
        (0..5)
            .map(|i| LatLon::new(start + f64::from(i), start + f64::from(i)))
            .collect()
    }

    fn sorted(mut entries: Vec<ElementGeometryEntry>) -> Vec<ElementGeometryEntry> {
        entries.sort_by_key(ElementGeometryEntry::key);
        entries
    }

    #[test]
    fn test_get_null() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        assert!(repo.get(ElementType::Node, 0).unwrap().is_none());
    }

    #[test]
    fn test_get_null_different_key() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put(&ElementGeometryEntry::new(ElementType::Node, 0, simple_geometry()))
            .unwrap();

        assert!(repo.get(ElementType::Way, 0).unwrap().is_none());
        assert!(repo.get(ElementType::Node, 1).unwrap().is_none());
    }

    #[test]
    fn test_simple_put_get() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put(&ElementGeometryEntry::new(ElementType::Node, 0, simple_geometry()))
            .unwrap();

        assert_eq!(
            repo.get(ElementType::Node, 0).unwrap(),
            Some(simple_geometry())
        );
    }

    #[test]
    fn test_polyline_geometry_put_get() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        let geometry = ElementGeometry::Polylines {
            polylines: vec![some_lat_lons(0.0)],
            center: LatLon::new(1.0, 2.0),
        };
        repo.put(&ElementGeometryEntry::new(ElementType::Way, 0, geometry.clone()))
            .unwrap();

        assert_eq!(repo.get(ElementType::Way, 0).unwrap(), Some(geometry));
    }

    #[test]
    fn test_polygon_geometry_put_get() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        let geometry = ElementGeometry::Polygons {
            polygons: vec![some_lat_lons(0.0), some_lat_lons(10.0)],
            center: LatLon::new(1.0, 2.0),
        };
        repo.put(&ElementGeometryEntry::new(
            ElementType::Relation,
            0,
            geometry.clone(),
        ))
        .unwrap();

        assert_eq!(repo.get(ElementType::Relation, 0).unwrap(), Some(geometry));
    }

    #[test]
    fn test_put_replaces_previous_geometry() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        let polygon = ElementGeometry::Polygons {
            polygons: vec![some_lat_lons(0.0)],
            center: LatLon::new(1.0, 1.0),
        };
        repo.put(&ElementGeometryEntry::new(ElementType::Way, 3, polygon))
            .unwrap();
        repo.put(&ElementGeometryEntry::new(ElementType::Way, 3, simple_geometry()))
            .unwrap();

        assert_eq!(
            repo.get(ElementType::Way, 3).unwrap(),
            Some(simple_geometry())
        );
    }

    #[test]
    fn test_put_all() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put_all(&[
            ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 2, simple_geometry()),
        ])
        .unwrap();

        assert!(repo.get(ElementType::Way, 2).unwrap().is_some());
        assert!(repo.get(ElementType::Node, 1).unwrap().is_some());
    }

    #[test]
    fn test_put_all_empty_is_noop() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put_all(&[]).unwrap();
        assert!(repo.get_all_keys().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_entries_for_element_keys() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put_all(&[
            ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Node, 2, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 2, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Relation, 1, simple_geometry()),
        ])
        .unwrap();

        let keys = [
            ElementKey::new(ElementType::Node, 1),
            ElementKey::new(ElementType::Way, 2),
            ElementKey::new(ElementType::Relation, 3),
        ];

        let expected = vec![
            ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 2, simple_geometry()),
        ];

        assert_eq!(sorted(repo.get_all_entries(&keys).unwrap()), expected);
    }

    #[test]
    fn test_get_all_entries_tolerates_duplicate_keys_and_repeats() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put(&ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()))
            .unwrap();

        let keys = [
            ElementKey::new(ElementType::Node, 1),
            ElementKey::new(ElementType::Node, 1),
        ];

        // The temporary table must be gone after each call
        assert_eq!(repo.get_all_entries(&keys).unwrap().len(), 1);
        assert_eq!(repo.get_all_entries(&keys).unwrap().len(), 1);
    }

    #[test]
    fn test_get_all_entries_empty_keys() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put(&ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()))
            .unwrap();

        assert!(repo.get_all_entries(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put(&ElementGeometryEntry::new(ElementType::Node, 0, simple_geometry()))
            .unwrap();

        assert!(repo.delete(ElementType::Node, 0).unwrap());
        assert!(!repo.delete(ElementType::Node, 0).unwrap());
        assert!(repo.get(ElementType::Node, 0).unwrap().is_none());
    }

    #[test]
    fn test_delete_all_counts_removed_rows() {
        let db = setup();
        let repo = SqliteElementGeometryRepository::new(db.connection());

        repo.put_all(&[
            ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 1, simple_geometry()),
        ])
        .unwrap();

        let deleted = repo
            .delete_all(&[
                ElementKey::new(ElementType::Node, 1),
                ElementKey::new(ElementType::Way, 1),
                ElementKey::new(ElementType::Way, 99),
            ])
            .unwrap();

        assert_eq!(deleted, 2);
        assert!(repo.get_all_keys().unwrap().is_empty());
        assert_eq!(repo.delete_all(&[]).unwrap(), 0);
    }

    #[test]
    fn test_bulk_operations_inside_open_transaction() {
        let db = setup();
        let keys = [
            ElementKey::new(ElementType::Node, 1),
            ElementKey::new(ElementType::Way, 2),
        ];

        let tx = db.connection().unchecked_transaction().unwrap();
        let repo = SqliteElementGeometryRepository::new(&tx);
        repo.put_all(&[
            ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry()),
            ElementGeometryEntry::new(ElementType::Way, 2, simple_geometry()),
        ])
        .unwrap();
        assert_eq!(repo.get_all_entries(&keys).unwrap().len(), 2);
        assert_eq!(repo.delete_all(&keys[..1]).unwrap(), 1);
        tx.commit().unwrap();

        let repo = SqliteElementGeometryRepository::new(db.connection());
        assert_eq!(repo.get_all_keys().unwrap(), vec![keys[1]]);
    }

    #[test]
    fn test_put_all_rolls_back_with_outer_transaction() {
        let db = setup();

        let tx = db.connection().unchecked_transaction().unwrap();
        SqliteElementGeometryRepository::new(&tx)
            .put_all(&[ElementGeometryEntry::new(ElementType::Node, 1, simple_geometry())])
            .unwrap();
        tx.rollback().unwrap();

        let repo = SqliteElementGeometryRepository::new(db.connection());
        assert!(repo.get(ElementType::Node, 1).unwrap().is_none());
    }
}
