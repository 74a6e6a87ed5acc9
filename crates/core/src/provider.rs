//! Content providers: where the viewer reads and writes side content.
//!
//! [`ContentProvider`] is the seam between the controller and the model.
//! [`NodeContentProvider`] serves [`DiffNode`] inputs, and
//! [`MirroredContentProvider`] wraps any provider to swap left and right.

use std::sync::Arc;

use tracing::debug;

use crate::config::ViewerSettings;
use crate::errors::PersistenceError;
use crate::input::{DiffNode, TypedElement};
use crate::side::{Pane, Side};

/// Header decoration for one pane. `None` fields leave the current header
/// text or image untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub label: Option<String>,
    /// Image key understood by the renderer.
    pub image: Option<String>,
}

/// Reads content, labels and editability for an input, and persists edits.
pub trait ContentProvider<I> {
    /// Content of a pane, `None` when the side does not exist.
    fn content(&self, pane: Pane, input: &I) -> Option<Vec<u8>>;

    fn label(&self, pane: Pane, input: &I) -> Option<String>;

    fn image(&self, _pane: Pane, _input: &I) -> Option<String> {
        None
    }

    fn is_editable(&self, side: Side, input: &I) -> bool;

    /// Persist a side. `None` means the side should have no content at all.
    fn save_content(
        &self,
        side: Side,
        input: &I,
        bytes: Option<&[u8]>,
    ) -> Result<(), PersistenceError>;

    /// Start reporting label changes for `input`.
    fn watch_labels(&self, _input: &Arc<I>) {}

    /// Stop reporting label changes for `input`.
    fn unwatch_labels(&self, _input: &Arc<I>) {}

    fn header(&self, pane: Pane, input: &I) -> Header {
        Header {
            label: self.label(pane, input),
            image: self.image(pane, input),
        }
    }
}

// ---------------------------------------------------------------------------
// Mirrored
// ---------------------------------------------------------------------------

/// Presents the right model on the left and the left model on the right.
pub struct MirroredContentProvider<I> {
    inner: Arc<dyn ContentProvider<I>>,
}

impl<I> MirroredContentProvider<I> {
    pub fn new(inner: Arc<dyn ContentProvider<I>>) -> Self {
        Self { inner }
    }
}

impl<I> ContentProvider<I> for MirroredContentProvider<I> {
    fn content(&self, pane: Pane, input: &I) -> Option<Vec<u8>> {
        self.inner.content(pane.mirrored(), input)
    }

    fn label(&self, pane: Pane, input: &I) -> Option<String> {
        self.inner.label(pane.mirrored(), input)
    }

    fn image(&self, pane: Pane, input: &I) -> Option<String> {
        self.inner.image(pane.mirrored(), input)
    }

    fn is_editable(&self, side: Side, input: &I) -> bool {
        self.inner.is_editable(side.opposite(), input)
    }

    fn save_content(
        &self,
        side: Side,
        input: &I,
        bytes: Option<&[u8]>,
    ) -> Result<(), PersistenceError> {
        self.inner.save_content(side.opposite(), input, bytes)
    }

    fn watch_labels(&self, input: &Arc<I>) {
        self.inner.watch_labels(input)
    }

    fn unwatch_labels(&self, input: &Arc<I>) {
        self.inner.unwatch_labels(input)
    }
}

// ---------------------------------------------------------------------------
// DiffNode provider
// ---------------------------------------------------------------------------

/// Serves [`DiffNode`] inputs and writes saved content back into the node.
#[derive(Debug, Clone)]
pub struct NodeContentProvider {
    left_editable: bool,
    right_editable: bool,
}

impl NodeContentProvider {
    pub fn new(left_editable: bool, right_editable: bool) -> Self {
        Self {
            left_editable,
            right_editable,
        }
    }

    pub fn from_settings(settings: &ViewerSettings) -> Self {
        Self::new(settings.left_editable, settings.right_editable)
    }

    fn element(pane: Pane, input: &DiffNode) -> Option<TypedElement> {
        match pane {
            Pane::Ancestor => input.ancestor(),
            Pane::Left => input.left(),
            Pane::Right => input.right(),
        }
    }
}

impl ContentProvider<DiffNode> for NodeContentProvider {
    fn content(&self, pane: Pane, input: &DiffNode) -> Option<Vec<u8>> {
        Self::element(pane, input).and_then(|e| e.content)
    }

    fn label(&self, pane: Pane, input: &DiffNode) -> Option<String> {
        Self::element(pane, input)
            .map(|e| e.name)
            .filter(|name| !name.is_empty())
    }

    fn image(&self, pane: Pane, input: &DiffNode) -> Option<String> {
        Self::element(pane, input).map(|e| e.type_name().to_string())
    }

    fn is_editable(&self, side: Side, _input: &DiffNode) -> bool {
        match side {
            Side::Left => self.left_editable,
            Side::Right => self.right_editable,
        }
    }

    fn save_content(
        &self,
        side: Side,
        input: &DiffNode,
        bytes: Option<&[u8]>,
    ) -> Result<(), PersistenceError> {
        if !self.is_editable(side, input) {
            return Err(PersistenceError::ReadOnly(side));
        }
        debug!(
            %side,
            len = bytes.map_or(0, |b| b.len()),
            absent = bytes.is_none(),
            "writing content back to node"
        );
        input.set_side_content(side, bytes.map(|b| b.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DiffKind;

    fn node() -> DiffNode {
        DiffNode::new(
            DiffKind::CHANGE | DiffKind::CONFLICTING,
            Some(TypedElement::new("base.txt", "base")),
            Some(TypedElement::new("left.txt", "left")),
            Some(TypedElement::new("right.txt", "right")),
        )
    }

    #[test]
    fn test_node_provider_reads_sides() {
        let provider = NodeContentProvider::new(true, true);
        let node = node();
        assert_eq!(
            provider.content(Pane::Ancestor, &node).as_deref(),
            Some(&b"base"[..])
        );
        assert_eq!(provider.label(Pane::Left, &node).as_deref(), Some("left.txt"));
        assert_eq!(provider.image(Pane::Right, &node).as_deref(), Some("txt"));
        assert_eq!(
            provider.header(Pane::Right, &node),
            Header {
                label: Some("right.txt".into()),
                image: Some("txt".into()),
            }
        );
    }

    #[test]
    fn test_node_provider_missing_side() {
        let provider = NodeContentProvider::new(true, true);
        let node = DiffNode::new(
            DiffKind::ADDITION,
            None,
            Some(TypedElement::new("new.txt", "x")),
            None,
        );
        assert!(provider.content(Pane::Right, &node).is_none());
        assert!(provider.label(Pane::Right, &node).is_none());
        assert!(provider.header(Pane::Ancestor, &node).label.is_none());
    }

    #[test]
    fn test_node_provider_save() {
        let provider = NodeContentProvider::new(true, false);
        let node = node();

        provider
            .save_content(Side::Left, &node, Some(&b"edited"[..]))
            .unwrap();
        assert_eq!(
            provider.content(Pane::Left, &node).as_deref(),
            Some(&b"edited"[..])
        );

        let err = provider
            .save_content(Side::Right, &node, Some(&b"nope"[..]))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::ReadOnly(Side::Right)));
        assert_eq!(
            provider.content(Pane::Right, &node).as_deref(),
            Some(&b"right"[..])
        );
    }

    #[test]
    fn test_mirrored_provider_swaps_sides() {
        let inner: Arc<dyn ContentProvider<DiffNode>> =
            Arc::new(NodeContentProvider::new(true, false));
        let mirrored = MirroredContentProvider::new(inner);
        let node = node();

        assert_eq!(
            mirrored.content(Pane::Left, &node).as_deref(),
            Some(&b"right"[..])
        );
        assert_eq!(
            mirrored.content(Pane::Ancestor, &node).as_deref(),
            Some(&b"base"[..])
        );
        assert_eq!(mirrored.label(Pane::Right, &node).as_deref(), Some("left.txt"));
        assert!(!mirrored.is_editable(Side::Left, &node));
        assert!(mirrored.is_editable(Side::Right, &node));

        mirrored
            .save_content(Side::Right, &node, Some(&b"via mirror"[..]))
            .unwrap();
        assert_eq!(
            node.left().unwrap().content.as_deref(),
            Some(&b"via mirror"[..])
        );
    }
}
