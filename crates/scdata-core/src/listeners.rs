//! Thread-safe listener registries

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned on registration, used to unregister again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ordered set of listeners.
///
/// Registration and removal may happen from any thread. Notifications are
/// delivered in registration order to a snapshot taken before the first call,
/// so a listener may add or remove listeners while being notified.
pub struct Listeners<L: ?Sized> {
    entries: Mutex<Vec<(ListenerId, Arc<L>)>>,
    next_id: AtomicU64,
}

impl<L: ?Sized> Listeners<L> {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Returns whether a listener with that id was registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn notify(&self, mut call: impl FnMut(&L)) {
        for listener in self.snapshot() {
            call(&*listener);
        }
    }
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    trait Recorder: Send + Sync {
        fn record(&self, log: &Mutex<Vec<u32>>);
    }

    struct Tag(u32);

    impl Recorder for Tag {
        fn record(&self, log: &Mutex<Vec<u32>>) {
            log.lock().unwrap().push(self.0);
        }
    }

    #[test]
    fn test_notifies_in_registration_order() {
        let listeners: Listeners<dyn Recorder> = Listeners::new();
        listeners.add(Arc::new(Tag(3)));
        listeners.add(Arc::new(Tag(1)));
        listeners.add(Arc::new(Tag(2)));

        let log = Mutex::new(Vec::new());
        listeners.notify(|listener| listener.record(&log));

        assert_eq!(*log.lock().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_remove() {
        let listeners: Listeners<dyn Recorder> = Listeners::new();
        let first = listeners.add(Arc::new(Tag(1)));
        listeners.add(Arc::new(Tag(2)));

        assert!(listeners.remove(first));
        assert!(!listeners.remove(first));

        let log = Mutex::new(Vec::new());
        listeners.notify(|listener| listener.record(&log));
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_registration_from_other_threads() {
        let listeners: Arc<Listeners<dyn Recorder>> = Arc::new(Listeners::new());

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let listeners = Arc::clone(&listeners);
                std::thread::spawn(move || listeners.add(Arc::new(Tag(n))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = Mutex::new(Vec::new());
        listeners.notify(|listener| listener.record(&log));
        let mut recorded = log.into_inner().unwrap();
        recorded.sort_unstable();
        assert_eq!(recorded, vec![0, 1, 2, 3]);
    }
}
