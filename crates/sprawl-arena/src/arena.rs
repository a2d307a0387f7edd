//! The grid arena context object.
//!
//! [`GridArena`] owns the arena block and everything derived from it: the
//! partition, the three typed pools, the guard registry, the growth
//! accumulators, the road index and the optional memory-map log. It is
//! built once per run from an [`ArenaConfig`] and dropped at the end.
//!
//! All methods take `&self` or `&mut self`; there is no global state, and a
//! grid slice borrowed from the arena cannot outlive a later mutation of it.

use std::path::Path;

use sprawl_core::{GridKind, Owner};

use crate::config::{ArenaConfig, CheckLevel};
use crate::error::ArenaError;
use crate::growth::GrowthAccumulators;
use crate::guard::{self, GuardRegistry};
use crate::handle::{ArenaId, GridHandle};
use crate::layout::Layout;
use crate::pool::{GridPool, PoolStats};
use crate::report::MemoryLog;
use crate::road::RoadIndex;
use crate::storage::{ArenaStorage, Partition, SlotRegion};

/// Pre-allocated grid memory for one simulation run.
///
/// # Example
///
/// ```
/// use sprawl_arena::{ArenaConfig, GridArena};
/// use sprawl_core::{owner, GridKind};
///
/// let mut arena = GridArena::new(ArenaConfig::new(8, 8).with_grid_counts(1, 1, 2)).unwrap();
/// let scratch = arena.acquire(GridKind::Working, owner!("spread")).unwrap();
/// arena.grid_mut(&scratch).unwrap().fill(1);
/// arena.release(scratch, owner!("spread")).unwrap();
/// arena.verify_all().unwrap();
/// ```
pub struct GridArena {
    id: ArenaId,
    config: ArenaConfig,
    layout: Layout,
    storage: ArenaStorage,
    partition: Partition,
    pools: Vec<GridPool>,
    guards: GuardRegistry,
    growth: GrowthAccumulators,
    roads: RoadIndex,
    log: Option<MemoryLog>,
}

impl GridArena {
    /// Size, allocate and partition the arena.
    ///
    /// Working grids are filled with the invalid pattern, every guard word is
    /// initialised, and every slot is pushed onto its pool's free stack. The
    /// growth accumulators and per-row road arrays are allocated here too;
    /// the road column array waits for
    /// [`allocate_road_columns`](Self::allocate_road_columns).
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        let layout = Layout::new(&config)?;
        let report = layout.report();
        for (name, value) in report.iter() {
            tracing::debug!(target: "sprawl_arena::layout", "{name} = {value}");
        }

        let mut storage = ArenaStorage::allocate(layout.total_bytes())?;
        tracing::info!(
            bytes = layout.total_bytes(),
            grids = layout.grid_count(),
            "allocated grid arena"
        );

        let partition = Partition::from_layout(&layout);
        for region in partition.slots_of(GridKind::Working) {
            guard::invalidate_grid(&mut storage, region);
        }
        let guards = GuardRegistry::new(&partition);
        guards.initialize(&mut storage);

        let id = ArenaId::next();
        let pools = GridKind::ALL
            .iter()
            .map(|&kind| GridPool::new(id, kind, partition.slots_of(kind)))
            .collect::<Result<Vec<_>, _>>()?;

        let growth = GrowthAccumulators::new(layout.grc_entries(), layout.grz_entries())?;
        tracing::info!(
            step = layout.grc_entries(),
            cumulative = layout.grz_entries(),
            "allocated growth accumulators"
        );
        let roads = RoadIndex::with_rows(layout.rows())?;

        let log = match (&config.output_dir, config.log_memory_map) {
            (Some(dir), true) => {
                let mut log = MemoryLog::create(dir)?;
                log.write_layout(&report)?;
                log.write_partition(&partition, storage.base_address())?;
                Some(log)
            }
            _ => None,
        };

        tracing::debug!(arena = %id, "grid arena ready");
        Ok(Self {
            id,
            config,
            layout,
            storage,
            partition,
            pools,
            guards,
            growth,
            roads,
            log,
        })
    }

    /// Identifier stamped into every handle this arena issues.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// The configuration the arena was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The computed layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The partition of the block.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// The guard registry.
    pub fn guards(&self) -> &GuardRegistry {
        &self.guards
    }

    /// One pool.
    pub fn pool(&self, kind: GridKind) -> &GridPool {
        &self.pools[kind.index()]
    }

    /// Take a grid of `kind` from its pool.
    ///
    /// In strict mode a Working grid is checked to still hold the invalid
    /// pattern before it is handed out.
    pub fn acquire(&mut self, kind: GridKind, owner: Owner) -> Result<GridHandle, ArenaError> {
        if self.checks_invalidation(kind) {
            if let Some(index) = self.pools[kind.index()].peek_free() {
                let region = self.region(kind, index)?;
                let slot = self.pools[kind.index()].slot(index);
                guard::check_invalid(&self.storage, region, slot)?;
            }
        }
        let handle = self.pools[kind.index()].acquire(owner)?;
        tracing::trace!(%handle, %owner, "acquired grid");
        Ok(handle)
    }

    /// Return a grid to its pool.
    ///
    /// Fails with [`ArenaError::UnmatchedRelease`] for a handle this arena
    /// did not issue and [`ArenaError::DoubleRelease`] for one already
    /// released. In strict mode a released Working grid is refilled with the
    /// invalid pattern.
    pub fn release(&mut self, handle: GridHandle, releaser: Owner) -> Result<(), ArenaError> {
        let kind = handle.kind();
        let index = self.pools[kind.index()].release(&handle, releaser)?;
        if self.checks_invalidation(kind) {
            let region = *self.region(kind, index)?;
            guard::invalidate_grid(&mut self.storage, &region);
        }
        tracing::trace!(%handle, %releaser, "released grid");
        Ok(())
    }

    /// Pixel data of a held grid.
    pub fn grid(&self, handle: &GridHandle) -> Result<&[u8], ArenaError> {
        let region = self.live_region(handle)?;
        Ok(self.storage.slice(region.offset, region.len))
    }

    /// Pixel data of a held grid, mutably.
    pub fn grid_mut(&mut self, handle: &GridHandle) -> Result<&mut [u8], ArenaError> {
        let region = *self.live_region(handle)?;
        Ok(self.storage.slice_mut(region.offset, region.len))
    }

    /// Lowest free count of a pool since the arena was built.
    pub fn min_free(&self, kind: GridKind) -> usize {
        self.pools[kind.index()].min_free()
    }

    /// Occupancy of every pool, in layout order.
    pub fn pool_stats(&self) -> [PoolStats; 3] {
        GridKind::ALL.map(|kind| self.pools[kind.index()].stats())
    }

    /// Re-read every guard word.
    pub fn verify_all(&self) -> Result<(), ArenaError> {
        self.guards
            .verify_all(&self.storage, &self.partition, &self.pools)
    }

    /// Check the content of the grid `handle` names.
    ///
    /// A released Working grid must still read as the invalid pattern (strict
    /// mode only); a held grid must hold no pixel above the configured
    /// maximum. Unlike [`grid`](Self::grid), this accepts a handle whose
    /// grid has since been released.
    pub fn verify_grid(&self, handle: &GridHandle) -> Result<(), ArenaError> {
        let region = self.owned_region(handle)?;
        let slot = self.pools[handle.kind().index()].slot(region.index);
        guard::verify_grid(
            &self.storage,
            region,
            slot,
            self.checks_invalidation(handle.kind()),
            self.config.diagnostics.max_pixel_value,
        )
    }

    /// Fill a held grid with the invalid pattern.
    pub fn invalidate_grid(&mut self, handle: &GridHandle) -> Result<(), ArenaError> {
        let region = *self.live_region(handle)?;
        guard::invalidate_grid(&mut self.storage, &region);
        Ok(())
    }

    /// Run the configured memory checks, recording `site` as the caller.
    ///
    /// Verifies every guard word, then every Working grid: held ones for
    /// pixel range, free ones (strict mode) for writes after release. A
    /// no-op at [`CheckLevel::Off`].
    pub fn check_memory(&mut self, site: Owner) -> Result<(), ArenaError> {
        if self.config.diagnostics.level == CheckLevel::Off {
            return Ok(());
        }
        tracing::debug!(%site, "memory check");
        let result = self.check_working_grids();
        if let Some(log) = self.log.as_mut() {
            match (log.write_check(site, result.is_ok()), &result) {
                (Err(e), Ok(())) => return Err(e),
                // The check failure outranks a log write failure.
                (Err(e), Err(_)) => tracing::warn!(error = %e, "memory log write failed"),
                (Ok(()), _) => {}
            }
        }
        result
    }

    fn check_working_grids(&self) -> Result<(), ArenaError> {
        self.verify_all()?;
        let pool = &self.pools[GridKind::Working.index()];
        let strict = self.checks_invalidation(GridKind::Working);
        for region in self.partition.slots_of(GridKind::Working) {
            guard::verify_grid(
                &self.storage,
                region,
                pool.slot(region.index),
                strict,
                self.config.diagnostics.max_pixel_value,
            )?;
        }
        Ok(())
    }

    /// Refill every Working grid and every guard word with the invalid
    /// pattern.
    ///
    /// Held Working grids are overwritten too; call this between runs.
    pub fn reinvalidate(&mut self) {
        for region in self.partition.slots_of(GridKind::Working) {
            guard::invalidate_grid(&mut self.storage, region);
        }
        self.guards.initialize(&mut self.storage);
        tracing::debug!(arena = %self.id, "reinvalidated working grids and guards");
    }

    /// Write the Working pool low-water mark to the tracing log and, when
    /// enabled, the memory-map log.
    pub fn log_min_free(&mut self) -> Result<(), ArenaError> {
        let stats = self.pools[GridKind::Working.index()].stats();
        tracing::info!(
            min_free = stats.min_free,
            "for max efficiency of memory usage reduce working grid count by {}",
            stats.min_free
        );
        if let Some(log) = self.log.as_mut() {
            log.write_min_free(&stats)?;
        }
        Ok(())
    }

    /// Path of the memory-map log, if one is being written.
    pub fn memory_log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(MemoryLog::path)
    }

    /// The growth accumulators.
    pub fn growth(&self) -> &GrowthAccumulators {
        &self.growth
    }

    /// The growth accumulators, mutably.
    pub fn growth_mut(&mut self) -> &mut GrowthAccumulators {
        &mut self.growth
    }

    /// Size the road column array for `road_pixels` road pixels.
    pub fn allocate_road_columns(&mut self, road_pixels: usize) -> Result<(), ArenaError> {
        self.roads.allocate_columns(road_pixels)
    }

    /// The road index.
    pub fn roads(&self) -> &RoadIndex {
        &self.roads
    }

    /// The road index, mutably.
    pub fn roads_mut(&mut self) -> &mut RoadIndex {
        &mut self.roads
    }

    /// Rebuild the road index from the held grid `handle` names.
    ///
    /// Non-zero pixels are roads; packed Input grids are decoded first.
    /// Returns the road pixel count.
    pub fn rebuild_road_index(&mut self, handle: &GridHandle) -> Result<usize, ArenaError> {
        let region = *self.live_region(handle)?;
        let cols = self.layout.cols();
        self.roads.rebuild_encoded(
            self.storage.slice(region.offset, region.len),
            region.encoding,
            cols,
        )
    }

    /// The whole arena block.
    pub fn raw_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    /// The whole arena block, mutably.
    ///
    /// Writes through this slice bypass every handle check; guard words and
    /// released grids can be overwritten.
    pub fn raw_bytes_mut(&mut self) -> &mut [u8] {
        self.storage.as_mut_slice()
    }

    fn checks_invalidation(&self, kind: GridKind) -> bool {
        self.config.diagnostics.strict() && guard::tracks_invalidation(kind)
    }

    fn region(&self, kind: GridKind, index: usize) -> Result<&SlotRegion, ArenaError> {
        self.partition
            .region(kind, index)
            .ok_or(ArenaError::StaleHandle { kind, slot: index })
    }

    /// Region of a handle issued by this arena, held or not.
    fn owned_region(&self, handle: &GridHandle) -> Result<&SlotRegion, ArenaError> {
        let region = self.region(handle.kind(), handle.slot())?;
        if handle.arena() != self.id || region.offset != handle.offset() {
            return Err(ArenaError::StaleHandle {
                kind: handle.kind(),
                slot: handle.slot(),
            });
        }
        Ok(region)
    }

    /// Region of a handle whose grid is still held through it.
    fn live_region(&self, handle: &GridHandle) -> Result<&SlotRegion, ArenaError> {
        let slot = self.pools[handle.kind().index()].live_slot(handle)?;
        let region = self.region(handle.kind(), handle.slot())?;
        debug_assert_eq!(slot.offset(), region.offset);
        Ok(region)
    }
}

impl Drop for GridArena {
    fn drop(&mut self) {
        tracing::debug!(arena = %self.id, bytes = self.storage.len(), "releasing grid arena");
    }
}
