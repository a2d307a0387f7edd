//! The arena block and its partition into guard words and grid buffers.
//!
//! [`ArenaStorage`] owns the single byte block obtained at startup. A
//! [`Partition`] walks a [`Layout`] and records where every guard word and
//! grid buffer lives inside that block:
//!
//! ```text
//! | G0 | igrid 0 | G1 | igrid 1 | ... | Gk | pgrid 0 | ... | Gn | wgrid m | Gn+1 |
//! ```
//!
//! Offsets are relative to the start of the block; nothing here holds a raw
//! pointer.

use sprawl_core::{GridKind, INVALID_PIXEL, WORD_BYTES};

use crate::error::ArenaError;
use crate::layout::{Layout, PixelEncoding};

/// The one pre-allocated arena block.
///
/// Zero-initialised at allocation. Never resized.
pub struct ArenaStorage {
    data: Vec<u8>,
}

impl ArenaStorage {
    /// Obtain a zeroed block of `total_bytes`.
    ///
    /// Returns [`ArenaError::AllocationFailure`] if the allocator refuses the
    /// request.
    pub fn allocate(total_bytes: usize) -> Result<Self, ArenaError> {
        let mut data = Vec::new();
        data.try_reserve_exact(total_bytes)
            .map_err(|_| ArenaError::AllocationFailure {
                requested: total_bytes,
                what: "grid arena",
            })?;
        data.resize(total_bytes, 0);
        Ok(Self { data })
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Address of the first byte, for the memory-map log.
    pub fn base_address(&self) -> usize {
        self.data.as_ptr() as usize
    }

    /// The whole block.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The whole block, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// A shared slice of `len` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the block.
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// A mutable slice of `len` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the block.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }

    /// Read the word at `offset` in native byte order.
    pub fn read_word(&self, offset: usize) -> u32 {
        let mut word = [0u8; WORD_BYTES];
        word.copy_from_slice(self.slice(offset, WORD_BYTES));
        u32::from_ne_bytes(word)
    }

    /// Write `value` to the word at `offset` in native byte order.
    pub fn write_word(&mut self, offset: usize, value: u32) {
        self.slice_mut(offset, WORD_BYTES)
            .copy_from_slice(&value.to_ne_bytes());
    }

    /// Fill `len` bytes at `offset` with the invalid pattern.
    pub fn invalidate(&mut self, offset: usize, len: usize) {
        self.slice_mut(offset, len).fill(INVALID_PIXEL);
    }
}

/// Location of one grid buffer inside the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRegion {
    /// Pool the grid belongs to.
    pub kind: GridKind,
    /// Index within its pool.
    pub index: usize,
    /// Offset of the guard word immediately before the buffer.
    pub guard_offset: usize,
    /// Offset of the first pixel byte.
    pub offset: usize,
    /// Bytes of pixel data.
    pub len: usize,
    /// Pixels stored in `len` bytes.
    pub pixels: usize,
    /// How those pixels are stored.
    pub encoding: PixelEncoding,
    /// Bytes the buffer occupies, padding included.
    pub padded_len: usize,
}

impl SlotRegion {
    /// Offset one past the padded buffer; where the next guard word sits.
    pub fn end(&self) -> usize {
        self.offset + self.padded_len
    }
}

/// Every guard-word and grid offset of a [`Layout`].
///
/// Guard `i` precedes grid `i` in layout order (Input, Persistent,
/// Working); the last guard follows the last grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    slots: Vec<SlotRegion>,
    first: [usize; 3],
    guards: Vec<usize>,
    end: usize,
}

impl Partition {
    /// Walk the block sequentially and record every offset.
    pub fn from_layout(layout: &Layout) -> Self {
        let mut slots = Vec::with_capacity(layout.grid_count());
        let mut guards = Vec::with_capacity(layout.guard_count());
        let mut first = [0; 3];
        let mut cursor = 0;
        for kind in GridKind::ALL {
            first[kind.index()] = slots.len();
            for index in 0..layout.count(kind) {
                guards.push(cursor);
                let guard_offset = cursor;
                cursor += WORD_BYTES;
                let region = SlotRegion {
                    kind,
                    index,
                    guard_offset,
                    offset: cursor,
                    len: layout.grid_len(kind),
                    pixels: layout.total_pixels(),
                    encoding: layout.encoding_of(kind),
                    padded_len: layout.slot_bytes(kind),
                };
                cursor = region.end();
                slots.push(region);
            }
        }
        guards.push(cursor);
        cursor += WORD_BYTES;
        debug_assert_eq!(cursor, layout.total_bytes());
        Self {
            slots,
            first,
            guards,
            end: cursor,
        }
    }

    /// All grid regions in layout order.
    pub fn slots(&self) -> &[SlotRegion] {
        &self.slots
    }

    /// Grid regions of one pool, in slot order.
    pub fn slots_of(&self, kind: GridKind) -> impl Iterator<Item = &SlotRegion> + '_ {
        self.slots.iter().filter(move |s| s.kind == kind)
    }

    /// Region of slot `index` in pool `kind`.
    pub fn region(&self, kind: GridKind, index: usize) -> Option<&SlotRegion> {
        self.slots
            .get(self.first[kind.index()] + index)
            .filter(|r| r.kind == kind)
    }

    /// Offsets of every guard word, trailing guard last.
    pub fn guards(&self) -> &[usize] {
        &self.guards
    }

    /// The grid whose buffer ends at guard `guard`, if any.
    ///
    /// Guard 0 sits at the start of the block and has no predecessor.
    pub fn slot_before_guard(&self, guard: usize) -> Option<&SlotRegion> {
        guard.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Offset one past the trailing guard word.
    pub fn end(&self) -> usize {
        self.end
    }
}
