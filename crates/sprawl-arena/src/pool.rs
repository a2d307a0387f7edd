//! Typed grid pools.
//!
//! A [`GridPool`] manages the slots of one [`GridKind`] as a LIFO free
//! stack with fixed capacity. Every slot is either on the free stack or held
//! by exactly one owner; the slot generation is bumped on each acquisition
//! so that handles from an earlier acquisition can be told apart.

use sprawl_core::{GridKind, Owner};

use crate::error::ArenaError;
use crate::handle::{ArenaId, GridHandle};
use crate::storage::SlotRegion;

/// Bookkeeping for one grid slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    offset: usize,
    len: usize,
    free: bool,
    generation: u32,
    current_owner: Option<Owner>,
    previous_owner: Option<Owner>,
    released_by: Option<Owner>,
}

impl Slot {
    fn new(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            free: false,
            generation: 0,
            current_owner: None,
            previous_owner: None,
            released_by: None,
        }
    }

    /// Byte offset of the buffer within the arena block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes of pixel data.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the slot has no pixel data.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the slot is on the free stack.
    pub fn is_free(&self) -> bool {
        self.free
    }

    /// Number of times the slot has been acquired.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Call site holding the slot, if in use.
    pub fn current_owner(&self) -> Option<Owner> {
        self.current_owner
    }

    /// Last call site that held the slot before the current one.
    pub fn previous_owner(&self) -> Option<Owner> {
        self.previous_owner
    }

    /// Call site of the most recent release.
    pub fn released_by(&self) -> Option<Owner> {
        self.released_by
    }
}

/// Snapshot of one pool's occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Pool kind.
    pub kind: GridKind,
    /// Number of slots.
    pub capacity: usize,
    /// Slots currently free.
    pub free: usize,
    /// Lowest free count seen since partition.
    pub min_free: usize,
}

impl PoolStats {
    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.free
    }
}

/// A fixed-capacity LIFO pool of same-kind grid slots.
pub struct GridPool {
    arena: ArenaId,
    kind: GridKind,
    slots: Vec<Slot>,
    free: Vec<usize>,
    min_free: usize,
}

impl GridPool {
    /// Build a pool over `regions` and push every slot onto the free stack.
    ///
    /// Slots are pushed in index order, so the highest index is handed out
    /// first.
    pub(crate) fn new<'a>(
        arena: ArenaId,
        kind: GridKind,
        regions: impl IntoIterator<Item = &'a SlotRegion>,
    ) -> Result<Self, ArenaError> {
        let slots: Vec<Slot> = regions
            .into_iter()
            .map(|r| Slot::new(r.offset, r.len))
            .collect();
        let capacity = slots.len();
        let mut free = Vec::new();
        free.try_reserve_exact(capacity)
            .map_err(|_| ArenaError::AllocationFailure {
                requested: capacity * std::mem::size_of::<usize>(),
                what: "free stack",
            })?;
        let mut pool = Self {
            arena,
            kind,
            slots,
            free,
            min_free: 0,
        };
        for index in 0..capacity {
            pool.push(index)?;
        }
        pool.min_free = pool.depth();
        Ok(pool)
    }

    /// Pool kind.
    pub fn kind(&self) -> GridKind {
        self.kind
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Current free stack depth.
    pub fn depth(&self) -> usize {
        self.free.len()
    }

    /// Lowest free stack depth seen since partition.
    pub fn min_free(&self) -> usize {
        self.min_free
    }

    /// All slots in index order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// One slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Occupancy snapshot.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            kind: self.kind,
            capacity: self.capacity(),
            free: self.depth(),
            min_free: self.min_free,
        }
    }

    /// Slot that the next `acquire` would hand out.
    pub(crate) fn peek_free(&self) -> Option<usize> {
        self.free.last().copied()
    }

    /// Pop the top of the free stack and hand it to `owner`.
    ///
    /// On an empty stack returns [`ArenaError::PoolExhausted`] and leaves the
    /// depth at 0.
    pub(crate) fn acquire(&mut self, owner: Owner) -> Result<GridHandle, ArenaError> {
        let index = self.free.pop().ok_or(ArenaError::PoolExhausted {
            kind: self.kind,
            capacity: self.capacity(),
            requested_by: owner,
        })?;
        self.min_free = self.min_free.min(self.free.len());

        let slot = &mut self.slots[index];
        slot.free = false;
        if let Some(prev) = slot.current_owner.take() {
            slot.previous_owner = Some(prev);
        }
        slot.current_owner = Some(owner);
        slot.generation = slot.generation.wrapping_add(1);
        Ok(GridHandle::new(
            self.arena,
            self.kind,
            index,
            slot.offset,
            slot.generation,
        ))
    }

    /// Return the grid named by `handle` to the free stack.
    ///
    /// The slot is located by matching the handle's buffer offset against
    /// the slot table. Returns the slot index.
    pub(crate) fn release(
        &mut self,
        handle: &GridHandle,
        releaser: Owner,
    ) -> Result<usize, ArenaError> {
        let index = self
            .find(handle)
            .ok_or(ArenaError::UnmatchedRelease {
                kind: handle.kind,
                offset: handle.offset,
                released_by: releaser,
            })?;
        let slot = &self.slots[index];
        if slot.free || slot.generation != handle.generation {
            return Err(ArenaError::DoubleRelease {
                kind: self.kind,
                slot: index,
                released_by: releaser,
                previous_release: slot.released_by,
            });
        }
        self.push(index)?;
        let slot = &mut self.slots[index];
        slot.previous_owner = slot.current_owner.take();
        slot.released_by = Some(releaser);
        Ok(index)
    }

    /// The slot `handle` names, if the handle is still live.
    pub(crate) fn live_slot(&self, handle: &GridHandle) -> Result<&Slot, ArenaError> {
        let stale = || ArenaError::StaleHandle {
            kind: handle.kind,
            slot: handle.slot,
        };
        if handle.arena != self.arena || handle.kind != self.kind {
            return Err(stale());
        }
        let slot = self.slots.get(handle.slot).ok_or_else(stale)?;
        if slot.free || slot.generation != handle.generation || slot.offset != handle.offset {
            return Err(stale());
        }
        Ok(slot)
    }

    fn find(&self, handle: &GridHandle) -> Option<usize> {
        if handle.arena != self.arena || handle.kind != self.kind {
            return None;
        }
        self.slots.iter().position(|s| s.offset == handle.offset)
    }

    fn push(&mut self, index: usize) -> Result<(), ArenaError> {
        if self.free.len() >= self.capacity() {
            return Err(ArenaError::PoolOverflow {
                kind: self.kind,
                capacity: self.capacity(),
            });
        }
        self.free.push(index);
        self.slots[index].free = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layout::PixelEncoding;
    use sprawl_core::owner;

    fn regions(kind: GridKind, n: usize) -> Vec<SlotRegion> {
        (0..n)
            .map(|index| SlotRegion {
                kind,
                index,
                guard_offset: index * 104,
                offset: index * 104 + 4,
                len: 100,
                pixels: 100,
                encoding: PixelEncoding::Unpacked,
                padded_len: 100,
            })
            .collect()
    }

    fn pool(kind: GridKind, n: usize) -> GridPool {
        GridPool::new(ArenaId::next(), kind, &regions(kind, n)).unwrap()
    }

    #[test]
    fn new_pool_is_full() {
        let p = pool(GridKind::Working, 4);
        assert_eq!(p.capacity(), 4);
        assert_eq!(p.depth(), 4);
        assert_eq!(p.min_free(), 4);
        assert!(p.slots().iter().all(Slot::is_free));
    }

    #[test]
    fn acquire_is_lifo() {
        let mut p = pool(GridKind::Working, 3);
        let a = p.acquire(owner!("t")).unwrap();
        assert_eq!(a.slot(), 2);
        p.release(&a, owner!("t")).unwrap();
        let b = p.acquire(owner!("t")).unwrap();
        assert_eq!(b.slot(), 2);
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn exhaustion_leaves_depth_at_zero() {
        let mut p = pool(GridKind::Working, 2);
        let _a = p.acquire(owner!("t")).unwrap();
        let _b = p.acquire(owner!("t")).unwrap();
        let err = p.acquire(owner!("third")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PoolExhausted);
        assert!(err.to_string().contains("working grid count"));
        assert_eq!(p.depth(), 0);
        assert_eq!(p.min_free(), 0);
    }

    #[test]
    fn push_past_capacity_overflows() {
        let mut p = pool(GridKind::Input, 2);
        let err = p.push(0).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::PoolOverflow {
                kind: GridKind::Input,
                capacity: 2
            }
        ));
    }

    #[test]
    fn owners_are_recorded() {
        let mut p = pool(GridKind::Persistent, 1);
        let first = owner!("first");
        let h = p.acquire(first).unwrap();
        assert_eq!(p.slot(0).current_owner(), Some(first));
        let releaser = owner!("cleanup");
        p.release(&h, releaser).unwrap();
        assert_eq!(p.slot(0).current_owner(), None);
        assert_eq!(p.slot(0).previous_owner(), Some(first));
        assert_eq!(p.slot(0).released_by(), Some(releaser));

        let second = owner!("second");
        let _h = p.acquire(second).unwrap();
        assert_eq!(p.slot(0).current_owner(), Some(second));
        assert_eq!(p.slot(0).previous_owner(), Some(first));
    }

    #[test]
    fn double_release_detected() {
        let mut p = pool(GridKind::Working, 2);
        let h = p.acquire(owner!("t")).unwrap();
        let first = owner!("first_release");
        p.release(&h, first).unwrap();
        let err = p.release(&h, owner!("second_release")).unwrap_err();
        match err {
            ArenaError::DoubleRelease {
                slot,
                previous_release,
                ..
            } => {
                assert_eq!(slot, h.slot());
                assert_eq!(previous_release, Some(first));
            }
            other => panic!("expected DoubleRelease, got {other:?}"),
        }
        assert_eq!(p.depth(), 2);
    }

    #[test]
    fn release_of_reacquired_slot_through_old_handle_detected() {
        let mut p = pool(GridKind::Working, 1);
        let old = p.acquire(owner!("t")).unwrap();
        p.release(&old, owner!("t")).unwrap();
        let _new = p.acquire(owner!("t")).unwrap();
        let err = p.release(&old, owner!("t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoubleRelease);
        assert_eq!(p.depth(), 0);
    }

    #[test]
    fn foreign_handle_unmatched() {
        let mut mine = pool(GridKind::Working, 2);
        let mut theirs = pool(GridKind::Working, 2);
        let h = theirs.acquire(owner!("t")).unwrap();
        let err = mine.release(&h, owner!("t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedRelease);
    }

    #[test]
    fn unknown_offset_unmatched() {
        let mut p = pool(GridKind::Working, 2);
        let h = p.acquire(owner!("t")).unwrap();
        let bogus = GridHandle::new(h.arena, h.kind, h.slot, h.offset + 1, h.generation);
        let err = p.release(&bogus, owner!("t")).unwrap_err();
        assert!(matches!(err, ArenaError::UnmatchedRelease { offset, .. } if offset == h.offset + 1));
    }

    #[test]
    fn live_slot_rejects_released_handle() {
        let mut p = pool(GridKind::Working, 1);
        let h = p.acquire(owner!("t")).unwrap();
        assert!(p.live_slot(&h).is_ok());
        p.release(&h, owner!("t")).unwrap();
        assert_eq!(p.live_slot(&h).unwrap_err().kind(), ErrorKind::StaleHandle);
    }

    #[test]
    fn min_free_is_zero_after_drain_and_refill() {
        let mut p = pool(GridKind::Working, 3);
        let handles: Vec<_> = (0..3).map(|_| p.acquire(owner!("t")).unwrap()).collect();
        for h in &handles {
            p.release(h, owner!("t")).unwrap();
        }
        assert_eq!(p.depth(), 3);
        assert_eq!(p.min_free(), 0);
        assert_eq!(p.stats().in_use(), 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn depth_tracks_outstanding_handles(
                capacity in 1usize..12,
                ops in proptest::collection::vec(any::<bool>(), 1..64),
            ) {
                let mut p = pool(GridKind::Working, capacity);
                let mut held: Vec<GridHandle> = Vec::new();
                let mut lowest = capacity;
                for acquire in ops {
                    if acquire {
                        match p.acquire(owner!("prop")) {
                            Ok(h) => held.push(h),
                            Err(e) => {
                                prop_assert_eq!(e.kind(), ErrorKind::PoolExhausted);
                                prop_assert_eq!(held.len(), capacity);
                            }
                        }
                    } else if let Some(h) = held.pop() {
                        p.release(&h, owner!("prop")).unwrap();
                    }
                    prop_assert_eq!(p.depth() + held.len(), capacity);
                    lowest = lowest.min(p.depth());
                    prop_assert_eq!(p.min_free(), lowest);
                }
                let in_use = p.slots().iter().filter(|s| !s.is_free()).count();
                prop_assert_eq!(in_use, held.len());
            }
        }
    }
}
