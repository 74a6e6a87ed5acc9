//! Terminal collaborators: a renderer that prints headers and a unified
//! diff, a dialoguer-backed save prompt and a console notifier.

use dialoguer::Select;
use tracing::{debug, warn};

use mergeview_core::confirm::{Confirmer, SaveDecision, SavePrompt};
use mergeview_core::errors::PersistenceError;
use mergeview_core::notify::{persistence_message, Notifier};
use mergeview_core::provider::Header;
use mergeview_core::renderer::Renderer;
use mergeview_core::side::{CopyDirection, Pane, Side};

use crate::style;

/// Prints what a viewer would show. Pane bytes are kept so edits can be
/// handed back to the controller.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    ancestor: Option<Vec<u8>>,
    left: Option<Vec<u8>>,
    right: Option<Vec<u8>>,
    ancestor_available: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unified diff of left against right, or `None` for binary content.
    pub fn diff(&self) -> Option<String> {
        let left = std::str::from_utf8(self.left.as_deref().unwrap_or_default()).ok()?;
        let right = std::str::from_utf8(self.right.as_deref().unwrap_or_default()).ok()?;
        let patch = diffy::create_patch(left, right);
        let formatter = if console::colors_enabled() {
            diffy::PatchFormatter::new().with_color()
        } else {
            diffy::PatchFormatter::new()
        };
        let text = formatter.fmt_patch(&patch).to_string();
        Some(text)
    }

    pub fn ancestor(&self) -> Option<&[u8]> {
        self.ancestor.as_deref()
    }
}

impl Renderer for TerminalRenderer {
    fn update_content(
        &mut self,
        ancestor: Option<&[u8]>,
        left: Option<&[u8]>,
        right: Option<&[u8]>,
    ) {
        self.ancestor = ancestor.map(<[u8]>::to_vec);
        self.left = left.map(<[u8]>::to_vec);
        self.right = right.map(<[u8]>::to_vec);

        if self.left.is_none() && self.right.is_none() {
            return;
        }
        match self.diff() {
            Some(diff) if diff.lines().count() > 2 => print!("{}", diff),
            Some(_) => println!("{}", style::dim("(no differences)")),
            None => println!("{}", style::dim("(binary content differs)")),
        }
    }

    fn contents(&self, side: Side) -> Option<Vec<u8>> {
        match side {
            Side::Left => self.left.clone(),
            Side::Right => self.right.clone(),
        }
    }

    fn set_contents(&mut self, side: Side, bytes: Vec<u8>) {
        match side {
            Side::Left => self.left = Some(bytes),
            Side::Right => self.right = Some(bytes),
        }
    }

    fn update_header(&mut self, pane: Pane, header: &Header) {
        if pane == Pane::Ancestor && !self.ancestor_available {
            return;
        }
        let tag = style::pane(&pane.to_string());
        let label = header.label.as_deref().unwrap_or("<unnamed>");
        match &header.image {
            Some(image) => println!("{} {} {}", tag, label, style::dim(image)),
            None => println!("{} {}", tag, label),
        }
    }

    fn set_ancestor_available(&mut self, available: bool) {
        self.ancestor_available = available;
    }

    fn set_copy_enabled(&mut self, direction: CopyDirection, enabled: bool) {
        debug!(?direction, enabled, "copy action");
    }
}

/// Asks on the terminal whether to save, discard or cancel.
pub struct DialoguerConfirmer;

impl Confirmer for DialoguerConfirmer {
    fn confirm(&self, prompt: &SavePrompt<'_>) -> SaveDecision {
        let dirty = match (prompt.left_dirty, prompt.right_dirty) {
            (true, true) => "left and right",
            (true, false) => "left",
            _ => "right",
        };
        println!();
        println!("{}", style::header(prompt.title));
        println!("{}", prompt.message);
        println!(
            "{}",
            style::dim(&format!("{} ({} modified)", prompt.input_name, dirty))
        );

        let choice = Select::new()
            .items(&["Save", "Don't save", "Cancel"])
            .default(0)
            .interact();
        match choice {
            Ok(0) => SaveDecision::Save,
            Ok(1) => SaveDecision::Discard,
            Ok(_) => SaveDecision::Cancel,
            Err(e) => {
                warn!(error = %e, "save prompt failed, keeping edits");
                SaveDecision::Cancel
            }
        }
    }
}

/// Reports failed saves on stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn persistence_failed(&self, input_name: &str, side: Side, error: &PersistenceError) {
        eprintln!("{}", style::error(&persistence_message(input_name, side, error)));
    }
}
