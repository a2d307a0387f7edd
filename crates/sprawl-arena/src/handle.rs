//! Grid handles.
//!
//! A [`GridHandle`] names one acquisition of one grid slot. It carries the
//! id of the arena that issued it, the slot's buffer offset, and the slot
//! generation at acquisition time, so a handle from another arena or from
//! an earlier acquisition of the same slot is rejected in O(1).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sprawl_core::GridKind;

static ARENA_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a [`GridArena`](crate::GridArena) instance.
///
/// Allocated from a process-wide counter; two arenas never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate the next id.
    pub(crate) fn next() -> Self {
        Self(ARENA_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena#{}", self.0)
    }
}

/// One acquisition of a grid slot.
///
/// Handles are `Copy`; copying one does not duplicate ownership. Once the
/// grid is released every copy is stale, and any use of it is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct GridHandle {
    pub(crate) arena: ArenaId,
    pub(crate) kind: GridKind,
    pub(crate) slot: usize,
    pub(crate) offset: usize,
    pub(crate) generation: u32,
}

impl GridHandle {
    pub(crate) fn new(
        arena: ArenaId,
        kind: GridKind,
        slot: usize,
        offset: usize,
        generation: u32,
    ) -> Self {
        Self {
            arena,
            kind,
            slot,
            offset,
            generation,
        }
    }

    /// Pool the grid belongs to.
    pub fn kind(&self) -> GridKind {
        self.kind
    }

    /// Slot index within the pool.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Byte offset of the grid buffer within the arena block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Slot generation at acquisition time.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Arena that issued this handle.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for GridHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GridHandle({}, {} {}, off={}, gen={})",
            self.arena,
            self.kind.label(),
            self.slot,
            self.offset,
            self.generation
        )
    }
}
