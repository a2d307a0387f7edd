//! Guard words and per-grid content checks.
//!
//! One guard word sits immediately before every grid buffer, plus one after
//! the last. All of them hold [`INVALID_WORD`]; a guard that reads anything
//! else was overwritten by the grid in front of it.
//!
//! The per-grid checks work on the pixel payload: a released Working grid
//! must still hold the invalid pattern everywhere, and an in-use grid must
//! hold no pixel above the configured maximum.

use sprawl_core::{GridKind, INVALID_PIXEL, INVALID_WORD};

use crate::error::ArenaError;
use crate::pool::{GridPool, Slot};
use crate::storage::{ArenaStorage, Partition, SlotRegion};

/// Offsets of every guard word in the arena.
#[derive(Clone, Debug)]
pub struct GuardRegistry {
    offsets: Vec<usize>,
}

impl GuardRegistry {
    /// Collect the guard offsets of `partition`.
    pub fn new(partition: &Partition) -> Self {
        Self {
            offsets: partition.guards().to_vec(),
        }
    }

    /// Number of guard words.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether there are no guard words.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets of every guard word.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Write the invalid pattern into every guard word.
    pub fn initialize(&self, storage: &mut ArenaStorage) {
        for &offset in &self.offsets {
            storage.write_word(offset, INVALID_WORD);
        }
    }

    /// Re-read every guard word.
    ///
    /// The first mismatch is reported as [`ArenaError::GuardCorruption`],
    /// naming the grid whose buffer precedes the guard together with that
    /// grid's owners. `pools` is indexed by [`GridKind::index`].
    pub fn verify_all(
        &self,
        storage: &ArenaStorage,
        partition: &Partition,
        pools: &[GridPool],
    ) -> Result<(), ArenaError> {
        for (guard, &offset) in self.offsets.iter().enumerate() {
            let found = storage.read_word(offset);
            if found == INVALID_WORD {
                continue;
            }
            let region = partition.slot_before_guard(guard);
            let slot = region.map(|r| pools[r.kind.index()].slot(r.index));
            return Err(ArenaError::GuardCorruption {
                guard,
                found,
                overrun_slot: region.map(|r| (r.kind, r.index)),
                current_owner: slot.and_then(Slot::current_owner),
                previous_owner: slot.and_then(Slot::previous_owner),
            });
        }
        Ok(())
    }
}

/// Fill the payload of `region` with the invalid pattern.
pub fn invalidate_grid(storage: &mut ArenaStorage, region: &SlotRegion) {
    storage.invalidate(region.offset, region.len);
}

/// Index of the first pixel of `region` that is not the invalid pattern.
pub fn first_valid_pixel(storage: &ArenaStorage, region: &SlotRegion) -> Option<usize> {
    storage
        .slice(region.offset, region.len)
        .iter()
        .position(|&b| b != INVALID_PIXEL)
}

/// First pixel of `region` above `max`, with its value.
///
/// Pixels are decoded with the region's encoding, so packed Input grids are
/// checked field by field.
pub fn first_out_of_range(
    storage: &ArenaStorage,
    region: &SlotRegion,
    max: u8,
) -> Option<(usize, u8)> {
    if max >= region.encoding.max_value() {
        return None;
    }
    region
        .encoding
        .pixels(storage.slice(region.offset, region.len), region.pixels)
        .enumerate()
        .find(|&(_, v)| v > max)
}

/// Check one grid's content against its slot state.
///
/// A free grid must read entirely as the invalid pattern when `strict` is
/// set; an in-use grid must hold no pixel above `max_pixel_value`.
pub fn verify_grid(
    storage: &ArenaStorage,
    region: &SlotRegion,
    slot: &Slot,
    strict: bool,
    max_pixel_value: u8,
) -> Result<(), ArenaError> {
    if slot.is_free() {
        if strict {
            check_invalid(storage, region, slot)?;
        }
        return Ok(());
    }
    if let Some((pixel, value)) = first_out_of_range(storage, region, max_pixel_value) {
        return Err(ArenaError::PixelRangeViolation {
            kind: region.kind,
            slot: region.index,
            pixel,
            value,
            max: max_pixel_value,
            current_owner: slot.current_owner(),
        });
    }
    Ok(())
}

/// Require that `region` still holds the invalid pattern.
pub fn check_invalid(
    storage: &ArenaStorage,
    region: &SlotRegion,
    slot: &Slot,
) -> Result<(), ArenaError> {
    match first_valid_pixel(storage, region) {
        None => Ok(()),
        Some(pixel) => Err(ArenaError::WriteAfterRelease {
            kind: region.kind,
            slot: region.index,
            pixel,
            previous_owner: slot.previous_owner(),
            released_by: slot.released_by(),
        }),
    }
}

/// Whether a kind gets its free grids invalidated and checked.
pub(crate) fn tracks_invalidation(kind: GridKind) -> bool {
    kind == GridKind::Working
}
