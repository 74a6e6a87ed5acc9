//! Ordered, identity-keyed listener list and the events it carries.

use std::sync::Arc;

use crate::side::CopyDirection;

/// Property key of dirty-state events.
pub const DIRTY_STATE: &str = "dirty-state";
/// Property key of three-way events.
pub const THREE_WAY: &str = "three-way";
/// Property key of ancestor-pane visibility events.
pub const ANCESTOR_VISIBLE: &str = "ancestor-visible";
pub const COPY_LEFT_TO_RIGHT: &str = "copy-left-to-right";
pub const COPY_RIGHT_TO_LEFT: &str = "copy-right-to-left";

/// Observable state change of a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// A side's dirty flag changed; carries the new value.
    DirtyState(bool),
    /// The bound input switched between two-way and three-way.
    ThreeWay(bool),
    /// The ancestor pane was shown or hidden.
    AncestorVisible(bool),
    /// A copy action became enabled or disabled.
    CopyEnabled {
        direction: CopyDirection,
        enabled: bool,
    },
}

impl ViewerEvent {
    pub fn property(&self) -> &'static str {
        match self {
            Self::DirtyState(_) => DIRTY_STATE,
            Self::ThreeWay(_) => THREE_WAY,
            Self::AncestorVisible(_) => ANCESTOR_VISIBLE,
            Self::CopyEnabled {
                direction: CopyDirection::LeftToRight,
                ..
            } => COPY_LEFT_TO_RIGHT,
            Self::CopyEnabled {
                direction: CopyDirection::RightToLeft,
                ..
            } => COPY_RIGHT_TO_LEFT,
        }
    }

    pub fn new_value(&self) -> bool {
        match *self {
            Self::DirtyState(v) | Self::ThreeWay(v) | Self::AncestorVisible(v) => v,
            Self::CopyEnabled { enabled, .. } => enabled,
        }
    }
}

/// Callback handle registered with a viewer.
pub type ViewerListener = Arc<dyn Fn(&ViewerEvent) + Send + Sync>;

/// Listeners in registration order. Adding a handle that is already present
/// (same `Arc`) is a no-op.
pub struct ListenerList<F: ?Sized> {
    listeners: Vec<Arc<F>>,
}

impl<F: ?Sized> Default for ListenerList<F> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<F: ?Sized> ListenerList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the handle was already registered.
    pub fn add(&mut self, listener: Arc<F>) -> bool {
        if self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Returns `false` if the handle was not registered.
    pub fn remove(&mut self, listener: &Arc<F>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Snapshot of the handles, so dispatch is unaffected by listeners that
    /// add or remove others.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.listeners.clone()
    }
}

impl ListenerList<dyn Fn(&ViewerEvent) + Send + Sync> {
    /// Notify every listener once, in registration order.
    pub fn fire(&self, event: &ViewerEvent) {
        for listener in self.snapshot() {
            listener(event);
        }
    }
}
