//! File-backed compare inputs.
//!
//! Each `compare` run builds one [`DiffNode`] from the files on the command
//! line and serves it through [`FileContentProvider`], which writes saved
//! sides back to disk before updating the node.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use mergeview_core::errors::PersistenceError;
use mergeview_core::input::{DiffKind, DiffNode, TypedElement};
use mergeview_core::provider::{ContentProvider, NodeContentProvider};
use mergeview_core::side::{Pane, Side};

/// Read an optional file. A missing path yields an absent side.
fn read_element(path: &Path) -> Result<Option<TypedElement>> {
    if !path.exists() {
        debug!(path = %path.display(), "side does not exist");
        return Ok(None);
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(TypedElement::new(path.display().to_string(), bytes)))
}

/// Derive the change kind of a comparison from its sides.
pub fn classify(
    ancestor: Option<&[u8]>,
    left: Option<&[u8]>,
    right: Option<&[u8]>,
) -> DiffKind {
    let change = match (left, right) {
        (Some(_), Some(_)) => DiffKind::CHANGE,
        (Some(_), None) | (None, Some(_)) if ancestor.is_none() => DiffKind::ADDITION,
        (Some(_), None) | (None, Some(_)) => DiffKind::DELETION,
        (None, None) => DiffKind::NO_CHANGE,
    };

    let Some(ancestor) = ancestor else {
        if left == right {
            return DiffKind::NO_CHANGE;
        }
        return change;
    };

    let left_changed = left != Some(ancestor);
    let right_changed = right != Some(ancestor);
    let direction = match (left_changed, right_changed) {
        (true, true) if left == right => DiffKind::CONFLICTING | DiffKind::PSEUDO_CONFLICT,
        (true, true) => DiffKind::CONFLICTING,
        (true, false) => DiffKind::LEFT,
        (false, true) => DiffKind::RIGHT,
        (false, false) => return DiffKind::NO_CHANGE,
    };
    change | direction
}

/// Paths behind the three panes.
#[derive(Debug, Clone)]
pub struct ComparePaths {
    pub ancestor: Option<PathBuf>,
    pub left: PathBuf,
    pub right: PathBuf,
}

impl ComparePaths {
    /// Load all sides into a node. At least one of left and right must exist.
    pub fn load(&self) -> Result<DiffNode> {
        let ancestor = match &self.ancestor {
            Some(path) => Some(
                read_element(path)?
                    .with_context(|| format!("ancestor {} does not exist", path.display()))?,
            ),
            None => None,
        };
        let left = read_element(&self.left)?;
        let right = read_element(&self.right)?;
        if left.is_none() && right.is_none() {
            anyhow::bail!(
                "neither {} nor {} exists",
                self.left.display(),
                self.right.display()
            );
        }

        let kind = classify(
            ancestor.as_ref().and_then(|e| e.content.as_deref()),
            left.as_ref().and_then(|e| e.content.as_deref()),
            right.as_ref().and_then(|e| e.content.as_deref()),
        );
        info!(%kind, "comparison loaded");
        Ok(DiffNode::new(kind, ancestor, left, right))
    }

    fn path(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Serves file-backed [`DiffNode`]s and persists saves to disk.
pub struct FileContentProvider {
    paths: ComparePaths,
    node: NodeContentProvider,
}

impl FileContentProvider {
    pub fn new(paths: ComparePaths, node: NodeContentProvider) -> Self {
        Self { paths, node }
    }

    fn write(&self, side: Side, bytes: Option<&[u8]>) -> Result<(), PersistenceError> {
        let path = self.paths.path(side);
        let io_error = |source: std::io::Error| PersistenceError::Io {
            side,
            path: path.display().to_string(),
            source,
        };
        match bytes {
            Some(bytes) => std::fs::write(path, bytes).map_err(io_error),
            None if path.exists() => std::fs::remove_file(path).map_err(io_error),
            None => Ok(()),
        }
    }
}

impl ContentProvider<DiffNode> for FileContentProvider {
    fn content(&self, pane: Pane, input: &DiffNode) -> Option<Vec<u8>> {
        self.node.content(pane, input)
    }

    fn label(&self, pane: Pane, input: &DiffNode) -> Option<String> {
        self.node.label(pane, input)
    }

    fn image(&self, pane: Pane, input: &DiffNode) -> Option<String> {
        self.node.image(pane, input)
    }

    fn is_editable(&self, side: Side, input: &DiffNode) -> bool {
        self.node.is_editable(side, input)
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
        self.write(side, bytes)?;
        info!(
            %side,
            path = %self.paths.path(side).display(),
            removed = bytes.is_none(),
            "side written"
        );
        self.node.save_content(side, input, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir, ancestor: bool) -> ComparePaths {
        ComparePaths {
            ancestor: ancestor.then(|| dir.path().join("base.txt")),
            left: dir.path().join("left.txt"),
            right: dir.path().join("right.txt"),
        }
    }

    fn b(text: &str) -> Option<&[u8]> {
        Some(text.as_bytes())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(None, b("a"), b("b")), DiffKind::CHANGE);
        assert_eq!(classify(None, b("a"), b("a")), DiffKind::NO_CHANGE);
        assert_eq!(classify(None, b("a"), None), DiffKind::ADDITION);
        assert_eq!(
            classify(b("o"), b("a"), b("o")),
            DiffKind::CHANGE | DiffKind::LEFT
        );
        assert_eq!(
            classify(b("o"), b("a"), b("b")),
            DiffKind::CHANGE | DiffKind::CONFLICTING
        );
        assert!(classify(b("o"), b("a"), b("a")).contains(DiffKind::PSEUDO_CONFLICT));
        assert_eq!(
            classify(b("o"), None, b("o")),
            DiffKind::DELETION | DiffKind::LEFT
        );
        assert_eq!(classify(b("o"), b("o"), b("o")), DiffKind::NO_CHANGE);
    }

    #[test]
    fn test_load_with_missing_side() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("left.txt"), "hello\n").unwrap();

        let node = paths(&dir, false).load().unwrap();
        assert!(node.right().is_none());
        assert_eq!(node.left().unwrap().content.as_deref(), Some(&b"hello\n"[..]));
    }

    #[test]
    fn test_load_requires_a_side() {
        let dir = TempDir::new().unwrap();
        assert!(paths(&dir, false).load().is_err());

        std::fs::write(dir.path().join("left.txt"), "x").unwrap();
        let err = paths(&dir, true).load().unwrap_err();
        assert!(err.to_string().contains("ancestor"));
    }

    #[test]
    fn test_save_writes_and_removes_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("left.txt"), "old\n").unwrap();
        std::fs::write(dir.path().join("right.txt"), "other\n").unwrap();
        let paths = paths(&dir, false);
        let node = paths.load().unwrap();
        let provider = FileContentProvider::new(paths, NodeContentProvider::new(true, false));

        provider
            .save_content(Side::Left, &node, Some(&b"new\n"[..]))
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("left.txt")).unwrap(),
            "new\n"
        );
        assert_eq!(
            provider.content(Pane::Left, &node).as_deref(),
            Some(&b"new\n"[..])
        );

        provider.save_content(Side::Left, &node, None).unwrap();
        assert!(!dir.path().join("left.txt").exists());

        let err = provider
            .save_content(Side::Right, &node, Some(&b"x"[..]))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::ReadOnly(Side::Right)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("right.txt")).unwrap(),
            "other\n"
        );
    }

    #[test]
    fn test_save_reports_io_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("left.txt"), "old\n").unwrap();
        let paths = ComparePaths {
            ancestor: None,
            left: dir.path().join("left.txt"),
            right: dir.path().join("missing").join("right.txt"),
        };
        let node = paths.load().unwrap();
        let provider = FileContentProvider::new(paths, NodeContentProvider::new(true, true));

        let err = provider
            .save_content(Side::Right, &node, Some(&b"x"[..]))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Io { side: Side::Right, .. }));
        assert!(node.right().is_none());
    }
}
