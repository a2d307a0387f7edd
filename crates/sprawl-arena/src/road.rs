//! Road-pixel sparse row index.
//!
//! Growth rules that follow roads only care about the few columns of each
//! row that hold a road pixel. [`RoadIndex`] stores, per row, how many road
//! pixels it has, their column span, and where its run starts in one flat
//! column array:
//!
//! ```text
//! row r:  count[r] = 3, min_col[r] = 4, max_col[r] = 12, start[r] = s
//! columns[s..s + 3] = [4, 9, 12]
//! ```
//!
//! The per-row arrays are sized from the row count at construction. The
//! column array is sized later, once the road pixel count is known.

use sprawl_core::{Coord, Pixel};

use crate::error::ArenaError;
use crate::layout::{PixelEncoding, ROAD_COLUMN_SLACK};

/// Per-row road counts, spans and offsets plus the flat column array.
#[derive(Clone, Debug, Default)]
pub struct RoadIndex {
    counts: Vec<u16>,
    min_col: Vec<Coord>,
    max_col: Vec<Coord>,
    start: Vec<u32>,
    columns: Vec<Coord>,
}

impl RoadIndex {
    /// Allocate the four per-row arrays for `rows` rows.
    ///
    /// The column array stays empty until [`allocate_columns`](Self::allocate_columns).
    pub fn with_rows(rows: usize) -> Result<Self, ArenaError> {
        Ok(Self {
            counts: zeroed(rows, "road row counts")?,
            min_col: zeroed(rows, "road row minimum")?,
            max_col: zeroed(rows, "road row maximum")?,
            start: zeroed(rows, "road row start")?,
            columns: Vec::new(),
        })
    }

    /// Size the column array for `road_pixels` road pixels plus slack.
    ///
    /// Replaces any earlier column array.
    pub fn allocate_columns(&mut self, road_pixels: usize) -> Result<(), ArenaError> {
        let len = road_pixels.saturating_add(ROAD_COLUMN_SLACK);
        self.columns = zeroed(len, "road columns")?;
        tracing::debug!(road_pixels, capacity = len, "allocated road column array");
        Ok(())
    }

    /// Number of rows indexed.
    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    /// Capacity of the column array.
    pub fn column_capacity(&self) -> usize {
        self.columns.len()
    }

    /// Road pixel count per row.
    pub fn counts(&self) -> &[u16] {
        &self.counts
    }

    /// Road pixel count per row, mutably.
    pub fn counts_mut(&mut self) -> &mut [u16] {
        &mut self.counts
    }

    /// Leftmost road column per row.
    pub fn min_cols(&self) -> &[Coord] {
        &self.min_col
    }

    /// Leftmost road column per row, mutably.
    pub fn min_cols_mut(&mut self) -> &mut [Coord] {
        &mut self.min_col
    }

    /// Rightmost road column per row.
    pub fn max_cols(&self) -> &[Coord] {
        &self.max_col
    }

    /// Rightmost road column per row, mutably.
    pub fn max_cols_mut(&mut self) -> &mut [Coord] {
        &mut self.max_col
    }

    /// Start of each row's run in the column array.
    pub fn starts(&self) -> &[u32] {
        &self.start
    }

    /// Start of each row's run in the column array, mutably.
    pub fn starts_mut(&mut self) -> &mut [u32] {
        &mut self.start
    }

    /// The flat column array.
    pub fn columns(&self) -> &[Coord] {
        &self.columns
    }

    /// The flat column array, mutably.
    pub fn columns_mut(&mut self) -> &mut [Coord] {
        &mut self.columns
    }

    /// Rebuild every array from `grid`, a row-major grid `cols` wide in
    /// which non-zero pixels are roads, one byte per pixel.
    ///
    /// Returns the number of road pixels found. `grid` must cover exactly
    /// [`rows`](Self::rows) rows; see [`rebuild_encoded`](Self::rebuild_encoded).
    pub fn rebuild(&mut self, grid: &[Pixel], cols: usize) -> Result<usize, ArenaError> {
        self.rebuild_encoded(grid, PixelEncoding::Unpacked, cols)
    }

    /// Rebuild every array from `grid`, whose pixels are stored with
    /// `encoding`.
    ///
    /// Fails with [`ArenaError::RoadGridShape`] unless `grid` holds exactly
    /// `rows × cols` pixels with `1 <= cols <= Coord::MAX`, and with
    /// [`ArenaError::RoadIndexOverflow`] if the road pixels do not fit the
    /// column array. On error the index is left untouched.
    pub fn rebuild_encoded(
        &mut self,
        grid: &[u8],
        encoding: PixelEncoding,
        cols: usize,
    ) -> Result<usize, ArenaError> {
        let rows = self.rows();
        let shape = ArenaError::RoadGridShape {
            len: grid.len(),
            rows,
            cols,
        };
        if cols == 0 || cols > Coord::MAX as usize {
            return Err(shape);
        }
        let total = match rows.checked_mul(cols) {
            Some(total) if encoding.bytes_for(total) == Some(grid.len()) => total,
            _ => return Err(shape),
        };

        let pixel = |i: usize| encoding.pixel(grid, i);
        let road_pixels = (0..total).filter(|&i| pixel(i) != 0).count();
        let capacity = self.columns.len().min(u32::MAX as usize);
        if road_pixels > capacity {
            return Err(ArenaError::RoadIndexOverflow {
                road_pixels,
                capacity,
            });
        }

        let mut next = 0usize;
        for row in 0..rows {
            let base = row * cols;
            self.start[row] = next as u32;
            self.min_col[row] = 0;
            self.max_col[row] = 0;
            let mut count = 0u16;
            // cols <= Coord::MAX, so neither the column nor the count wraps.
            for col in (0..cols).filter(|&c| pixel(base + c) != 0) {
                let col = col as Coord;
                if count == 0 {
                    self.min_col[row] = col;
                }
                self.max_col[row] = col;
                self.columns[next] = col;
                next += 1;
                count += 1;
            }
            self.counts[row] = count;
        }
        tracing::trace!(road_pixels, rows, "rebuilt road index");
        Ok(road_pixels)
    }

    /// Road columns of `row`, in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range or the row's run lies outside the
    /// column array.
    pub fn row_columns(&self, row: usize) -> &[Coord] {
        let start = self.start[row] as usize;
        &self.columns[start..start + self.counts[row] as usize]
    }

    /// Indices of rows holding at least one road pixel.
    pub fn rows_with_roads(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(row, _)| row)
    }
}

fn zeroed<T: Copy + Default>(len: usize, what: &'static str) -> Result<Vec<T>, ArenaError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ArenaError::AllocationFailure {
            requested: len.saturating_mul(std::mem::size_of::<T>()),
            what,
        })?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn with_rows_sizes_per_row_arrays() {
        let index = RoadIndex::with_rows(5).unwrap();
        assert_eq!(index.rows(), 5);
        assert_eq!(index.counts().len(), 5);
        assert_eq!(index.starts().len(), 5);
        assert_eq!(index.column_capacity(), 0);
    }

    #[test]
    fn allocate_columns_adds_slack() {
        let mut index = RoadIndex::with_rows(2).unwrap();
        index.allocate_columns(10).unwrap();
        assert_eq!(index.column_capacity(), 10 + ROAD_COLUMN_SLACK);
    }

    #[test]
    fn manual_population_round_trip() {
        let mut index = RoadIndex::with_rows(3).unwrap();
        index.allocate_columns(3).unwrap();
        index.counts_mut()[1] = 3;
        index.min_cols_mut()[1] = 4;
        index.max_cols_mut()[1] = 12;
        index.starts_mut()[1] = 0;
        index.columns_mut()[..3].copy_from_slice(&[4, 9, 12]);

        assert_eq!(index.row_columns(1), &[4, 9, 12]);
        assert_eq!(index.min_cols()[1], 4);
        assert_eq!(index.max_cols()[1], 12);
        assert!(index.row_columns(0).is_empty());
        assert_eq!(index.rows_with_roads().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn rebuild_from_grid() {
        let cols = 16;
        let mut grid = vec![0u8; 3 * cols];
        for c in [4, 9, 12] {
            grid[cols + c] = 1;
        }
        grid[2 * cols] = 7;

        let mut index = RoadIndex::with_rows(3).unwrap();
        index.allocate_columns(4).unwrap();
        assert_eq!(index.rebuild(&grid, cols).unwrap(), 4);

        assert_eq!(index.counts(), &[0, 3, 1]);
        assert_eq!(index.row_columns(1), &[4, 9, 12]);
        assert_eq!(index.min_cols()[1], 4);
        assert_eq!(index.max_cols()[1], 12);
        assert_eq!(index.row_columns(2), &[0]);
        assert_eq!(index.starts(), &[0, 0, 3]);
        assert_eq!(index.rows_with_roads().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn rebuild_clears_previous_contents() {
        let mut index = RoadIndex::with_rows(2).unwrap();
        index.allocate_columns(2).unwrap();
        index.rebuild(&[1, 1, 0, 0], 2).unwrap();
        assert_eq!(index.counts(), &[2, 0]);
        index.rebuild(&[0, 0, 0, 1], 2).unwrap();
        assert_eq!(index.counts(), &[0, 1]);
        assert_eq!(index.row_columns(1), &[1]);
        assert_eq!(index.min_cols()[0], 0);
    }

    #[test]
    fn rebuild_overflow() {
        let mut index = RoadIndex::with_rows(1).unwrap();
        let err = index.rebuild(&[1, 1, 1], 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoadIndexOverflow);
        assert!(matches!(
            err,
            ArenaError::RoadIndexOverflow {
                road_pixels: 3,
                capacity: 0
            }
        ));
    }

    #[test]
    fn rebuild_rejects_partial_rows() {
        let mut index = RoadIndex::with_rows(2).unwrap();
        index.allocate_columns(1).unwrap();
        let err = index.rebuild(&[0, 0, 1], 2).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::RoadGridShape {
                len: 3,
                rows: 2,
                cols: 2
            }
        ));
        // Too long is as wrong as too short.
        let err = index.rebuild(&[0, 0, 1, 0, 1], 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoadGridShape);
        assert_eq!(index.counts(), &[0, 0]);
    }

    #[test]
    fn rebuild_rejects_widths_outside_coord_range() {
        let mut index = RoadIndex::with_rows(1).unwrap();
        index.allocate_columns(1).unwrap();
        let wide = vec![0u8; Coord::MAX as usize + 1];
        let err = index.rebuild(&wide, wide.len()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoadGridShape);
        let err = index.rebuild(&[], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoadGridShape);

        let mut widest = vec![0u8; Coord::MAX as usize];
        widest[Coord::MAX as usize - 1] = 1;
        assert_eq!(index.rebuild(&widest, widest.len()).unwrap(), 1);
        assert_eq!(index.row_columns(0), &[Coord::MAX - 1]);
    }

    #[test]
    fn rebuild_decodes_packed_grid() {
        // 4x4 grid, 4-bit pixels, roads at (0, 1) and (3, 3).
        let mut grid = [0u8; 8];
        grid[0] = 0x10;
        grid[7] = 0x10;
        let mut index = RoadIndex::with_rows(4).unwrap();
        index.allocate_columns(2).unwrap();
        let n = index
            .rebuild_encoded(&grid, PixelEncoding::Packed { bits: 4 }, 4)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(index.counts(), &[1, 0, 0, 1]);
        assert_eq!(index.row_columns(0), &[1]);
        assert_eq!(index.row_columns(3), &[3]);
        assert_eq!(index.rows_with_roads().collect::<Vec<_>>(), vec![0, 3]);

        // The unpacked reading of the same bytes would need 16 of them.
        let err = index.rebuild(&grid, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoadGridShape);
    }

    #[test]
    #[should_panic]
    fn out_of_range_row_panics() {
        let index = RoadIndex::with_rows(2).unwrap();
        let _ = index.row_columns(2);
    }
}
