//! The rendering side of a viewer: panes, headers and toolbar.

use crate::provider::Header;
use crate::side::{CopyDirection, Pane, Side};

/// Materializes content on screen and hands edited bytes back on demand.
///
/// Only `update_content`, `contents` and `set_contents` are required; the
/// decoration hooks default to no-ops for headless renderers.
pub trait Renderer {
    /// Show new content in the three panes.
    fn update_content(
        &mut self,
        ancestor: Option<&[u8]>,
        left: Option<&[u8]>,
        right: Option<&[u8]>,
    );

    /// Current raw bytes of a side, `None` if the pane holds no content.
    fn contents(&self, side: Side) -> Option<Vec<u8>>;

    /// Replace a side's bytes, as an editor would after a user edit.
    fn set_contents(&mut self, side: Side, bytes: Vec<u8>);

    fn update_header(&mut self, _pane: Pane, _header: &Header) {}

    /// Whether the ancestor pane may be offered for the current input.
    fn set_ancestor_available(&mut self, _available: bool) {}

    fn set_copy_enabled(&mut self, _direction: CopyDirection, _enabled: bool) {}

    /// Recompute pane geometry.
    fn relayout(&mut self) {}
}

/// A renderer that keeps pane bytes in memory and draws nothing.
#[derive(Debug, Clone, Default)]
pub struct BufferRenderer {
    pub ancestor: Option<Vec<u8>>,
    pub left: Option<Vec<u8>>,
    pub right: Option<Vec<u8>>,
}

impl Renderer for BufferRenderer {
    fn update_content(
        &mut self,
        ancestor: Option<&[u8]>,
        left: Option<&[u8]>,
        right: Option<&[u8]>,
    ) {
        self.ancestor = ancestor.map(<[u8]>::to_vec);
        self.left = left.map(<[u8]>::to_vec);
        self.right = right.map(<[u8]>::to_vec);
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
}
