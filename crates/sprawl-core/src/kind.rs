//! The three grid pool kinds.

use std::fmt;

/// Which pool a grid slot belongs to.
///
/// The arena lays grids out in this order (Input, Persistent, Working), and
/// the discriminant doubles as the pool index inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridKind {
    /// Read-only layers loaded at startup (slope, land cover, roads, ...).
    ///
    /// The only kind that may be stored bit-packed.
    Input,
    /// Layers that live for the whole run (cumulative urbanization, deltas).
    Persistent,
    /// Scratch grids borrowed and returned inside a growth step.
    Working,
}

impl GridKind {
    /// All kinds in arena layout order.
    pub const ALL: [GridKind; 3] = [GridKind::Input, GridKind::Persistent, GridKind::Working];

    /// Pool index of this kind (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Persistent => 1,
            Self::Working => 2,
        }
    }

    /// Short lowercase label used in the memory-map log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "igrid",
            Self::Persistent => "pgrid",
            Self::Working => "wgrid",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Persistent => write!(f, "persistent"),
            Self::Working => write!(f, "working"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_layout_order() {
        for (i, kind) in GridKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn labels_are_distinct() {
        assert_eq!(GridKind::Input.label(), "igrid");
        assert_eq!(GridKind::Persistent.label(), "pgrid");
        assert_eq!(GridKind::Working.label(), "wgrid");
    }

    #[test]
    fn display_is_lowercase_name() {
        assert_eq!(GridKind::Working.to_string(), "working");
    }
}
