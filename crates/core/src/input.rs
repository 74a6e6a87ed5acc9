//! Compare inputs: the subjects a viewer is bound to.
//!
//! The controller only needs to know an input's change kind (if it has one)
//! and whether it is a hunk; everything else flows through the
//! [`ContentProvider`](crate::provider::ContentProvider). [`DiffNode`] is the
//! stock structured input.

use std::sync::RwLock;

use tracing::warn;

use crate::side::Side;

// ---------------------------------------------------------------------------
// Change kind
// ---------------------------------------------------------------------------

/// Bit set describing how the sides of a comparison differ.
///
/// The low two bits carry the change type, the next two the direction. Any
/// direction bit means the comparison was made against a common ancestor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DiffKind(u8);

impl DiffKind {
    pub const NO_CHANGE: Self = Self(0);
    pub const ADDITION: Self = Self(1);
    pub const DELETION: Self = Self(2);
    pub const CHANGE: Self = Self(3);
    pub const LEFT: Self = Self(4);
    pub const RIGHT: Self = Self(8);
    pub const CONFLICTING: Self = Self(12);
    pub const PSEUDO_CONFLICT: Self = Self(16);

    const CHANGE_TYPE_MASK: u8 = 3;
    const DIRECTION_MASK: u8 = 12;

    /// The change-type part (`ADDITION`, `DELETION`, `CHANGE` or none).
    pub const fn change_type(self) -> Self {
        Self(self.0 & Self::CHANGE_TYPE_MASK)
    }

    /// The direction part (`LEFT`, `RIGHT`, `CONFLICTING` or none).
    pub const fn direction(self) -> Self {
        Self(self.0 & Self::DIRECTION_MASK)
    }

    pub const fn is_three_way(self) -> bool {
        self.0 & Self::DIRECTION_MASK != 0
    }

    pub const fn is_conflicting(self) -> bool {
        self.0 & Self::DIRECTION_MASK == Self::DIRECTION_MASK
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DiffKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let change = match self.change_type() {
            Self::ADDITION => "addition",
            Self::DELETION => "deletion",
            Self::CHANGE => "change",
            _ => "no-change",
        };
        let direction = match self.direction() {
            Self::LEFT => "+left",
            Self::RIGHT => "+right",
            Self::CONFLICTING => "+conflicting",
            _ => "",
        };
        write!(f, "{}{}", change, direction)?;
        if self.contains(Self::PSEUDO_CONFLICT) {
            write!(f, "+pseudo")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input trait
// ---------------------------------------------------------------------------

/// A comparison subject the viewer can be bound to.
pub trait CompareInput {
    /// The change kind of a structured input, `None` for anything else.
    fn kind(&self) -> Option<DiffKind>;

    /// Whether the input is a single hunk of a larger patch. Hunks are always
    /// shown three-way.
    fn is_hunk(&self) -> bool {
        false
    }

    /// Display name for headers and log lines.
    fn name(&self) -> String;
}

// ---------------------------------------------------------------------------
// DiffNode
// ---------------------------------------------------------------------------

/// A named piece of content on one side of a [`DiffNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedElement {
    pub name: String,
    /// `None` when the element exists by name only (e.g. a deleted file).
    pub content: Option<Vec<u8>>,
}

impl TypedElement {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
        }
    }

    /// File-name extension used as the content type, `"???"` when unknown.
    pub fn type_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => "???",
        }
    }
}

#[derive(Debug, Default)]
struct Sides {
    ancestor: Option<TypedElement>,
    left: Option<TypedElement>,
    right: Option<TypedElement>,
}

/// Structured three-way (or two-way) input.
///
/// Sides are behind a lock so a provider can write saved content back through
/// a shared `Arc<DiffNode>`.
#[derive(Debug)]
pub struct DiffNode {
    kind: DiffKind,
    hunk: bool,
    swap_sides: bool,
    sides: RwLock<Sides>,
}

impl DiffNode {
    pub fn new(
        kind: DiffKind,
        ancestor: Option<TypedElement>,
        left: Option<TypedElement>,
        right: Option<TypedElement>,
    ) -> Self {
        Self {
            kind,
            hunk: false,
            swap_sides: false,
            sides: RwLock::new(Sides {
                ancestor,
                left,
                right,
            }),
        }
    }

    /// Two-way node with a plain `CHANGE` kind.
    pub fn two_way(left: TypedElement, right: TypedElement) -> Self {
        Self::new(DiffKind::CHANGE, None, Some(left), Some(right))
    }

    /// Mark the node as a hunk of a patch.
    pub fn into_hunk(mut self) -> Self {
        self.hunk = true;
        self
    }

    /// Compose names left-first instead of right-first.
    pub fn with_swapped_sides(mut self, swap: bool) -> Self {
        self.swap_sides = swap;
        self
    }

    pub fn ancestor(&self) -> Option<TypedElement> {
        self.read(|s| s.ancestor.clone())
    }

    pub fn left(&self) -> Option<TypedElement> {
        self.read(|s| s.left.clone())
    }

    pub fn right(&self) -> Option<TypedElement> {
        self.read(|s| s.right.clone())
    }

    /// Replace the content of one side, creating an unnamed element if the
    /// side was missing.
    pub fn set_side_content(&self, side: Side, content: Option<Vec<u8>>) {
        let mut sides = match self.sides.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("diff node lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let slot = match side {
            Side::Left => &mut sides.left,
            Side::Right => &mut sides.right,
        };
        slot.get_or_insert_with(|| TypedElement::absent(String::new()))
            .content = content;
    }

    fn read<T>(&self, f: impl FnOnce(&Sides) -> T) -> T {
        match self.sides.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => {
                warn!("diff node lock was poisoned, recovering");
                f(&poisoned.into_inner())
            }
        }
    }
}

impl CompareInput for DiffNode {
    fn kind(&self) -> Option<DiffKind> {
        Some(self.kind)
    }

    fn is_hunk(&self) -> bool {
        self.hunk
    }

    fn name(&self) -> String {
        self.read(|s| {
            let left = s.left.as_ref().map(|e| e.name.as_str());
            let right = s.right.as_ref().map(|e| e.name.as_str());
            match (left, right) {
                (None, None) => s
                    .ancestor
                    .as_ref()
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| "<no name>".to_string()),
                (Some(l), None) => l.to_string(),
                (None, Some(r)) => r.to_string(),
                (Some(l), Some(r)) if l == r => r.to_string(),
                (Some(l), Some(r)) if self.swap_sides => format!("{} - {}", l, r),
                (Some(l), Some(r)) => format!("{} - {}", r, l),
            }
        })
    }
}
