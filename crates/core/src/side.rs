//! Side, pane and copy-direction identifiers shared by every collaborator.

/// One of the two editable sides of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// One of the three content panes. The ancestor pane is never editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Ancestor,
    Left,
    Right,
}

impl Pane {
    /// Swap left and right; the ancestor stays put.
    pub fn mirrored(self) -> Self {
        match self {
            Self::Ancestor => Self::Ancestor,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl From<Side> for Pane {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Pane::Left,
            Side::Right => Pane::Right,
        }
    }
}

impl std::fmt::Display for Pane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ancestor => write!(f, "ancestor"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Direction of a copy toolbar action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyDirection {
    LeftToRight,
    RightToLeft,
}

impl CopyDirection {
    pub fn source(self) -> Side {
        match self {
            Self::LeftToRight => Side::Left,
            Self::RightToLeft => Side::Right,
        }
    }

    pub fn target(self) -> Side {
        self.source().opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_and_mirror() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Pane::Left.mirrored(), Pane::Right);
        assert_eq!(Pane::Ancestor.mirrored(), Pane::Ancestor);
        assert_eq!(Pane::from(Side::Right), Pane::Right);
    }

    #[test]
    fn test_copy_direction_sides() {
        assert_eq!(CopyDirection::LeftToRight.source(), Side::Left);
        assert_eq!(CopyDirection::LeftToRight.target(), Side::Right);
        assert_eq!(CopyDirection::RightToLeft.target(), Side::Left);
    }
}
