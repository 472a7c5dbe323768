//! Stores downloaded notes and notifies listeners

use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{NoteRepository, SqliteNoteRepository};
use crate::listeners::{ListenerId, Listeners};
use crate::models::{BoundingBox, LatLon, Note};
use crate::services::DatabaseService;
use crate::Result;

use super::{NoteListener, NoteSource};

/// Result of a bulk note update, in listener order
#[derive(Debug, Default)]
struct NoteChanges {
    added: Vec<Note>,
    updated: Vec<Note>,
    deleted: Vec<i64>,
}

impl NoteChanges {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

pub struct NoteController {
    db: DatabaseService,
    listeners: Listeners<dyn NoteListener>,
}

impl NoteController {
    pub const fn new(db: DatabaseService) -> Self {
        Self {
            db,
            listeners: Listeners::new(),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&SqliteNoteRepository<'_>) -> Result<T>) -> Result<T> {
        self.db
            .with_connection(|conn| f(&SqliteNoteRepository::new(conn)))
    }

    fn notify(&self, changes: &NoteChanges) {
        if changes.is_empty() {
            return;
        }
        self.listeners.notify(|listener| {
            listener.on_updated(&changes.added, &changes.updated, &changes.deleted);
        });
    }

    /// Store a single note fetched from the server
    pub fn put(&self, note: Note) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let existed = self.read(|repo| {
            let existed = repo.get(note.id)?.is_some();
            repo.put(&note, now)?;
            Ok(existed)
        })?;

        let changes = if existed {
            NoteChanges {
                updated: vec![note],
                ..NoteChanges::default()
            }
        } else {
            NoteChanges {
                added: vec![note],
                ..NoteChanges::default()
            }
        };
        self.notify(&changes);
        Ok(())
    }

    /// Delete a note, returning whether it existed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.read(|repo| repo.delete(id))?;
        if deleted {
            self.notify(&NoteChanges {
                deleted: vec![id],
                ..NoteChanges::default()
            });
        }
        Ok(deleted)
    }

    /// Replace every note inside `bbox` with a fresh download of that area.
    ///
    /// Stored notes in the area that are missing from `notes` are deleted.
    pub fn put_all_for_bbox(&self, bbox: &BoundingBox, notes: Vec<Note>) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let changes = self.db.with_connection(|conn| {
            let tx = conn.unchecked_transaction()?;
            let repo = SqliteNoteRepository::new(&tx);

            let new_ids: Vec<i64> = notes.iter().map(|note| note.id).collect();
            let existing: HashSet<i64> = repo
                .get_all(&new_ids)?
                .into_iter()
                .map(|note| note.id)
                .collect();
            let new_ids: HashSet<i64> = new_ids.into_iter().collect();
            let deleted: Vec<i64> = repo
                .get_all_ids_in(bbox)?
                .into_iter()
                .filter(|id| !new_ids.contains(id))
                .collect();

            repo.delete_all(&deleted)?;
            repo.put_all(&notes, now)?;
            tx.commit()?;

            let (updated, added): (Vec<Note>, Vec<Note>) = notes
                .into_iter()
                .partition(|note| existing.contains(&note.id));
            Ok(NoteChanges {
                added,
                updated,
                deleted,
            })
        })?;

        tracing::debug!(
            "Replaced notes in area: {} added, {} updated, {} deleted",
            changes.added.len(),
            changes.updated.len(),
            changes.deleted.len()
        );
        self.notify(&changes);
        Ok(())
    }

    /// Delete notes last downloaded strictly before `timestamp`
    pub fn delete_older_than(&self, timestamp: i64) -> Result<usize> {
        let deleted = self.db.with_connection(|conn| {
            let tx = conn.unchecked_transaction()?;
            let repo = SqliteNoteRepository::new(&tx);
            let ids = repo.get_ids_older_than(timestamp)?;
            repo.delete_all(&ids)?;
            tx.commit()?;
            Ok(ids)
        })?;

        let count = deleted.len();
        if count > 0 {
            tracing::debug!("Deleted {count} old notes");
        }
        self.notify(&NoteChanges {
            deleted,
            ..NoteChanges::default()
        });
        Ok(count)
    }
}

impl NoteSource for NoteController {
    fn get(&self, id: i64) -> Result<Option<Note>> {
        self.read(|repo| repo.get(id))
    }

    fn get_all(&self, bbox: &BoundingBox) -> Result<Vec<Note>> {
        self.read(|repo| repo.get_all_in(bbox))
    }

    fn get_all_positions(&self, bbox: &BoundingBox) -> Result<Vec<LatLon>> {
        self.read(|repo| repo.get_all_positions(bbox))
    }

    fn add_listener(&self, listener: Arc<dyn NoteListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteStatus;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    type Update = (Vec<i64>, Vec<i64>, Vec<i64>);

    #[derive(Default)]
    struct RecordingListener {
        updates: Mutex<Vec<Update>>,
    }

    impl RecordingListener {
        fn take(&self) -> Vec<Update> {
            std::mem::take(&mut *self.updates.lock().unwrap())
        }
    }

    impl NoteListener for RecordingListener {
        fn on_updated(&self, added: &[Note], updated: &[Note], deleted: &[i64]) {
            let ids = |notes: &[Note]| notes.iter().map(|note| note.id).collect::<Vec<_>>();
            self.updates
                .lock()
                .unwrap()
                .push((ids(added), ids(updated), deleted.to_vec()));
        }
    }

    fn note(id: i64, latitude: f64, longitude: f64) -> Note {
        Note {
            id,
            position: LatLon::new(latitude, longitude),
            status: NoteStatus::Open,
            created_at: 10,
            closed_at: None,
            comments: Vec::new(),
        }
    }

    fn setup() -> (NoteController, Arc<RecordingListener>) {
        let controller = NoteController::new(DatabaseService::open_in_memory().unwrap());
        let listener = Arc::new(RecordingListener::default());
        controller.add_listener(listener.clone());
        (controller, listener)
    }

    #[test]
    fn test_put_emits_added_then_updated() {
        let (controller, listener) = setup();

        controller.put(note(1, 0.5, 0.5)).unwrap();
        controller.put(note(1, 0.6, 0.6)).unwrap();

        assert_eq!(
            listener.take(),
            vec![
                (vec![1], vec![], vec![]),
                (vec![], vec![1], vec![]),
            ]
        );
        assert_eq!(
            controller.get(1).unwrap().map(|note| note.position),
            Some(LatLon::new(0.6, 0.6))
        );
    }

    #[test]
    fn test_delete() {
        let (controller, listener) = setup();
        controller.put(note(1, 0.5, 0.5)).unwrap();
        listener.take();

        assert!(controller.delete(1).unwrap());
        assert!(!controller.delete(1).unwrap());
        assert_eq!(listener.take(), vec![(vec![], vec![], vec![1])]);
    }

    #[test]
    fn test_put_all_for_bbox_replaces_area() {
        let (controller, listener) = setup();
        controller.put(note(1, 0.5, 0.5)).unwrap();
        controller.put(note(2, 0.5, 0.5)).unwrap();
        controller.put(note(3, 5.0, 5.0)).unwrap();
        listener.take();

        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        controller
            .put_all_for_bbox(&bbox, vec![note(2, 0.7, 0.7), note(4, 0.1, 0.1)])
            .unwrap();

        assert_eq!(listener.take(), vec![(vec![4], vec![2], vec![1])]);
        let ids: Vec<i64> = controller
            .get_all(&bbox)
            .unwrap()
            .iter()
            .map(|note| note.id)
            .collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(controller.get(3).unwrap().is_some());
        assert_eq!(controller.get_all_positions(&bbox).unwrap().len(), 2);
    }

    #[test]
    fn test_put_all_for_empty_bbox_is_silent() {
        let (controller, listener) = setup();
        controller
            .put_all_for_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), Vec::new())
            .unwrap();
        assert!(listener.take().is_empty());
    }

    #[test]
    fn test_delete_older_than() {
        let (controller, listener) = setup();
        controller.put(note(1, 0.5, 0.5)).unwrap();
        listener.take();

        let future = chrono::Utc::now().timestamp_millis() + 60_000;
        assert_eq!(controller.delete_older_than(0).unwrap(), 0);
        assert_eq!(controller.delete_older_than(future).unwrap(), 1);
        assert_eq!(listener.take(), vec![(vec![], vec![], vec![1])]);
    }
}
