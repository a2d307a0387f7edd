//! Growth coordinate accumulators.
//!
//! Growth rules record every pixel they urbanize as a `(row, col)` pair.
//! The step accumulator (GRC) collects one step's new pixels; the cumulative
//! accumulator (GRZ) collects them across a run and is associated with the
//! grid they are later painted into. Both are sized once from the grid
//! dimensions and reused for the lifetime of the arena.

use sprawl_core::Coord;

use crate::error::ArenaError;
use crate::handle::GridHandle;

/// Two parallel coordinate arrays plus a count of valid entries.
#[derive(Clone, Debug)]
pub struct GrowthAccumulator {
    rows: Vec<Coord>,
    cols: Vec<Coord>,
    count: usize,
}

impl GrowthAccumulator {
    /// Allocate an accumulator holding up to `capacity` coordinates.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            rows: zeroed(capacity, "growth rows")?,
            cols: zeroed(capacity, "growth cols")?,
            count: 0,
        })
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    /// Number of valid entries.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether there are no valid entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Set the number of valid entries after filling the raw arrays.
    pub fn set_count(&mut self, count: usize) -> Result<(), ArenaError> {
        if count > self.capacity() {
            return Err(ArenaError::AccumulatorOverflow {
                requested: count,
                capacity: self.capacity(),
            });
        }
        self.count = count;
        Ok(())
    }

    /// Append one coordinate.
    pub fn push(&mut self, row: Coord, col: Coord) -> Result<(), ArenaError> {
        if self.count == self.capacity() {
            return Err(ArenaError::AccumulatorOverflow {
                requested: self.count + 1,
                capacity: self.capacity(),
            });
        }
        self.rows[self.count] = row;
        self.cols[self.count] = col;
        self.count += 1;
        Ok(())
    }

    /// Forget every entry. Storage is kept.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Valid row coordinates.
    pub fn rows(&self) -> &[Coord] {
        &self.rows[..self.count]
    }

    /// Valid column coordinates.
    pub fn cols(&self) -> &[Coord] {
        &self.cols[..self.count]
    }

    /// The full row array, for external population.
    pub fn rows_mut(&mut self) -> &mut [Coord] {
        &mut self.rows
    }

    /// The full column array, for external population.
    pub fn cols_mut(&mut self) -> &mut [Coord] {
        &mut self.cols
    }

    /// Both full arrays at once.
    pub fn coords_mut(&mut self) -> (&mut [Coord], &mut [Coord]) {
        (&mut self.rows, &mut self.cols)
    }

    /// Valid `(row, col)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.rows().iter().copied().zip(self.cols().iter().copied())
    }
}

/// The step and cumulative accumulators.
#[derive(Clone, Debug)]
pub struct GrowthAccumulators {
    step: GrowthAccumulator,
    cumulative: GrowthAccumulator,
    cumulative_grid: Option<GridHandle>,
}

impl GrowthAccumulators {
    /// Allocate both accumulators.
    pub fn new(step_capacity: usize, cumulative_capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            step: GrowthAccumulator::with_capacity(step_capacity)?,
            cumulative: GrowthAccumulator::with_capacity(cumulative_capacity)?,
            cumulative_grid: None,
        })
    }

    /// The step accumulator (GRC).
    pub fn step(&self) -> &GrowthAccumulator {
        &self.step
    }

    /// The step accumulator, mutably.
    pub fn step_mut(&mut self) -> &mut GrowthAccumulator {
        &mut self.step
    }

    /// The cumulative accumulator (GRZ).
    pub fn cumulative(&self) -> &GrowthAccumulator {
        &self.cumulative
    }

    /// The cumulative accumulator, mutably.
    pub fn cumulative_mut(&mut self) -> &mut GrowthAccumulator {
        &mut self.cumulative
    }

    /// Grid the cumulative coordinates belong to.
    pub fn cumulative_grid(&self) -> Option<GridHandle> {
        self.cumulative_grid
    }

    /// Associate (or clear) the cumulative grid.
    pub fn set_cumulative_grid(&mut self, grid: Option<GridHandle>) {
        self.cumulative_grid = grid;
    }

    /// Append the step entries to the cumulative accumulator, then clear the step.
    pub fn commit_step(&mut self) -> Result<(), ArenaError> {
        let needed = self.cumulative.count() + self.step.count();
        if needed > self.cumulative.capacity() {
            return Err(ArenaError::AccumulatorOverflow {
                requested: needed,
                capacity: self.cumulative.capacity(),
            });
        }
        for (row, col) in self.step.iter() {
            self.cumulative.push(row, col)?;
        }
        self.step.clear();
        Ok(())
    }
}

fn zeroed(len: usize, what: &'static str) -> Result<Vec<Coord>, ArenaError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ArenaError::AllocationFailure {
            requested: len.saturating_mul(std::mem::size_of::<Coord>()),
            what,
        })?;
    v.resize(len, 0);
    Ok(v)
}
