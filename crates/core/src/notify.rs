//! Non-blocking user notifications.
//!
//! A failed save must not block the viewer or lose the edit; the controller
//! logs it, keeps the side dirty and tells the [`Notifier`].

use tracing::warn;

use crate::errors::PersistenceError;
use crate::side::Side;

pub trait Notifier {
    /// A side could not be persisted. The side is still dirty.
    fn persistence_failed(&self, input_name: &str, side: Side, error: &PersistenceError);
}

/// Notifier that only writes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn persistence_failed(&self, input_name: &str, side: Side, error: &PersistenceError) {
        warn!(input = input_name, %side, error = %error, "edit kept unsaved");
    }
}

/// Format the user-facing text for a failed save.
pub fn persistence_message(input_name: &str, side: Side, error: &PersistenceError) -> String {
    format!(
        "Could not save the {} side of '{}': {}. Your changes are still pending; save again to retry.",
        side, input_name, error
    )
}
