//! Synchronous save confirmation.
//!
//! The controller never talks to a dialog toolkit; it asks a [`Confirmer`]
//! and blocks until it answers.

/// Why the controller is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// The bound input is about to be replaced (or mirrored).
    InputSwitch,
    /// The bound input changed outside the viewer.
    ExternalChange,
}

/// What the confirmer is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePrompt<'a> {
    pub kind: PromptKind,
    pub title: &'a str,
    pub message: &'a str,
    /// Display name of the input holding the edits.
    pub input_name: String,
    pub left_dirty: bool,
    pub right_dirty: bool,
}

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    /// Flush both sides.
    Save,
    /// Drop the edits.
    Discard,
    /// Abort the operation that asked.
    Cancel,
}

pub trait Confirmer {
    fn confirm(&self, prompt: &SavePrompt<'_>) -> SaveDecision;
}

impl<F> Confirmer for F
where
    F: Fn(&SavePrompt<'_>) -> SaveDecision,
{
    fn confirm(&self, prompt: &SavePrompt<'_>) -> SaveDecision {
        self(prompt)
    }
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub SaveDecision);

impl Confirmer for FixedDecision {
    fn confirm(&self, _prompt: &SavePrompt<'_>) -> SaveDecision {
        self.0
    }
}
