//! mergeview core library.
//!
//! This crate provides the toolkit-agnostic heart of a compare/merge viewer:
//! the controller that tracks per-side dirty state, resolves pending edits
//! before the bound input changes, and negotiates three-way layout with the
//! host, plus the collaborator traits it talks to.

pub mod config;
pub mod confirm;
pub mod container;
pub mod controller;
pub mod errors;
pub mod input;
pub mod listeners;
pub mod merge;
pub mod notify;
pub mod provider;
pub mod renderer;
pub mod side;

// Re-exports for convenience.
pub use config::{SavePolicy, ViewerConfig};
pub use confirm::{Confirmer, SaveDecision, SavePrompt};
pub use container::{Container, WatchRegistry};
pub use controller::{MergeViewerController, SwitchOutcome};
pub use errors::{ConfigError, PersistenceError, ViewerError};
pub use input::{CompareInput, DiffKind, DiffNode, TypedElement};
pub use listeners::ViewerEvent;
pub use provider::{ContentProvider, NodeContentProvider};
pub use renderer::Renderer;
pub use side::{CopyDirection, Pane, Side};
