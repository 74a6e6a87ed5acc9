//! The container that hosts a viewer: per-input change listeners and the
//! save-in-progress query.
//!
//! The host calls
//! [`MergeViewerController::on_input_changed`](crate::controller::MergeViewerController::on_input_changed)
//! for inputs the controller registered interest in; the container only has
//! to remember which inputs those are.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Services the surrounding editor offers to the controller.
pub trait Container<I> {
    /// Start delivering out-of-band change notifications for `input`.
    fn add_input_change_listener(&self, input: &Arc<I>);

    /// Stop delivering change notifications for `input`.
    fn remove_input_change_listener(&self, input: &Arc<I>);

    /// Whether a save of either side is currently running.
    fn is_saving(&self) -> bool;
}

/// In-process [`Container`] that records registrations by identity.
pub struct WatchRegistry<I> {
    watched: Mutex<Vec<Arc<I>>>,
    saves_in_flight: Arc<AtomicUsize>,
}

impl<I> Default for WatchRegistry<I> {
    fn default() -> Self {
        Self {
            watched: Mutex::new(Vec::new()),
            saves_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<I> WatchRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `input` currently has a change listener registered.
    pub fn is_watching(&self, input: &Arc<I>) -> bool {
        self.lock().iter().any(|w| Arc::ptr_eq(w, input))
    }

    /// Number of registered inputs.
    pub fn watched_count(&self) -> usize {
        self.lock().len()
    }

    /// Mark a save as running until the returned guard is dropped.
    pub fn begin_save(&self) -> SaveGuard {
        self.saves_in_flight.fetch_add(1, Ordering::SeqCst);
        SaveGuard(self.saves_in_flight.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<I>>> {
        match self.watched.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("watch registry mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl<I> Container<I> for WatchRegistry<I> {
    fn add_input_change_listener(&self, input: &Arc<I>) {
        let mut watched = self.lock();
        if !watched.iter().any(|w| Arc::ptr_eq(w, input)) {
            watched.push(input.clone());
            debug!(count = watched.len(), "input change listener added");
        }
    }

    fn remove_input_change_listener(&self, input: &Arc<I>) {
        let mut watched = self.lock();
        watched.retain(|w| !Arc::ptr_eq(w, input));
        debug!(count = watched.len(), "input change listener removed");
    }

    fn is_saving(&self) -> bool {
        self.saves_in_flight.load(Ordering::SeqCst) > 0
    }
}

/// RAII guard that ends a save on drop (even on panic).
#[must_use = "the save ends as soon as the guard is dropped"]
pub struct SaveGuard(Arc<AtomicUsize>);

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrations_by_identity() {
        let registry = WatchRegistry::new();
        let a = Arc::new(String::from("same"));
        let b = Arc::new(String::from("same"));

        registry.add_input_change_listener(&a);
        registry.add_input_change_listener(&a);
        assert_eq!(registry.watched_count(), 1);
        assert!(registry.is_watching(&a));
        assert!(!registry.is_watching(&b));

        registry.add_input_change_listener(&b);
        registry.remove_input_change_listener(&a);
        assert!(!registry.is_watching(&a));
        assert!(registry.is_watching(&b));
    }

    #[test]
    fn test_save_guard() {
        let registry: WatchRegistry<String> = WatchRegistry::new();
        assert!(!registry.is_saving());

        let first = registry.begin_save();
        let second = registry.begin_save();
        assert!(registry.is_saving());

        drop(first);
        assert!(registry.is_saving());
        drop(second);
        assert!(!registry.is_saving());
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let registry: Arc<WatchRegistry<String>> = Arc::new(WatchRegistry::new());
        let a = Arc::new(String::from("a"));
        registry.add_input_change_listener(&a);

        let holder = registry.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.watched.lock().unwrap();
            panic!("holder panicked");
        })
        .join();
        assert!(registry.watched.is_poisoned());

        assert!(registry.is_watching(&a));
        registry.remove_input_change_listener(&a);
        assert_eq!(registry.watched_count(), 0);
    }
}
