//! Arena sizing arithmetic.
//!
//! [`Layout`] turns an [`ArenaConfig`] into every byte count the arena and its
//! auxiliary structures need: per-grid buffer sizes (rounded to the guard
//! word width), the total block size, and the growth-accumulator and road
//! index capacities. It is computed once and never changes for a run.

use std::fmt;

use indexmap::IndexMap;
use sprawl_core::{Coord, GridKind, Pixel, WORD_BYTES};

use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// Upper bound on growth accumulator entries.
pub const GRC_MAX_ENTRIES: usize = 15_000_000;

/// Below this many GRC bytes, the cumulative accumulator gets twice the
/// step accumulator's capacity.
pub const GRZ_DOUBLE_THRESHOLD_BYTES: usize = 7_500_000;

/// Extra entries in the road column array beyond the road pixel count.
pub const ROAD_COLUMN_SLACK: usize = 20;

/// How pixels of Input grids are stored.
///
/// Persistent and Working grids are always unpacked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelEncoding {
    /// One byte per pixel.
    #[default]
    Unpacked,
    /// `bits` bits per pixel; `bits` must be 1, 2 or 4.
    Packed {
        /// Bits per pixel.
        bits: u8,
    },
}

impl PixelEncoding {
    /// Bits used by one pixel.
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::Unpacked => 8,
            Self::Packed { bits } => bits as usize,
        }
    }

    /// Whether Input grids are bit-packed.
    pub fn is_packed(self) -> bool {
        matches!(self, Self::Packed { .. })
    }

    /// Reject bit widths that do not divide a byte evenly.
    pub fn validate(self) -> Result<(), ArenaError> {
        match self {
            Self::Unpacked | Self::Packed { bits: 1 | 2 | 4 } => Ok(()),
            Self::Packed { bits } => Err(ArenaError::InvalidConfig {
                reason: format!("packed pixel width must be 1, 2 or 4 bits (got {bits})"),
            }),
        }
    }

    /// Bytes needed to store `pixels` pixels, before word rounding.
    pub fn bytes_for(self, pixels: usize) -> Option<usize> {
        match self {
            Self::Unpacked => Some(pixels),
            Self::Packed { bits } => pixels.checked_mul(bits as usize)?.checked_add(7).map(|b| b / 8),
        }
    }

    /// Largest value one pixel can hold.
    pub fn max_value(self) -> Pixel {
        match self {
            Self::Unpacked => Pixel::MAX,
            Self::Packed { bits } => (1u16 << bits).wrapping_sub(1) as Pixel,
        }
    }

    /// Value of pixel `index` in `bytes`.
    ///
    /// Packed pixels fill each byte from the least significant bit up, so
    /// with 4-bit pixels byte `0x21` holds pixel 0 = 1 and pixel 1 = 2.
    ///
    /// # Panics
    ///
    /// Panics if `index` lies beyond `bytes`.
    pub fn pixel(self, bytes: &[u8], index: usize) -> Pixel {
        match self {
            Self::Unpacked => bytes[index],
            Self::Packed { bits } => {
                let bit = index * bits as usize;
                (bytes[bit / 8] >> (bit % 8)) & self.max_value()
            }
        }
    }

    /// The first `count` pixels of `bytes`, decoded.
    pub fn pixels(self, bytes: &[u8], count: usize) -> impl Iterator<Item = Pixel> + '_ {
        (0..count).map(move |i| self.pixel(bytes, i))
    }
}

/// Round `bytes` up to the next multiple of [`WORD_BYTES`].
///
/// Returns `None` on overflow.
pub fn round_to_word(bytes: usize) -> Option<usize> {
    bytes
        .checked_add(WORD_BYTES - 1)
        .map(|b| b / WORD_BYTES * WORD_BYTES)
}

/// Every size derived from the arena configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    rows: usize,
    cols: usize,
    total_pixels: usize,
    counts: [usize; 3],
    encoding: PixelEncoding,
    bytes_per_grid: usize,
    bytes_per_grid_rounded: usize,
    bytes_per_packed_grid: usize,
    bytes_per_packed_grid_rounded: usize,
    guard_count: usize,
    total_bytes: usize,
    grc_entries: usize,
    grz_entries: usize,
}

fn overflow(what: &str) -> ArenaError {
    ArenaError::InvalidConfig {
        reason: format!("{what} overflows the address space"),
    }
}

impl Layout {
    /// Compute the layout for `config`.
    ///
    /// The config is validated first. Arithmetic overflow is reported as
    /// [`ArenaError::InvalidConfig`].
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;

        let total_pixels = config
            .rows
            .checked_mul(config.cols)
            .ok_or_else(|| overflow("pixel count"))?;
        let bytes_per_grid = total_pixels;
        let bytes_per_grid_rounded =
            round_to_word(bytes_per_grid).ok_or_else(|| overflow("grid size"))?;
        let bytes_per_packed_grid = config
            .encoding
            .bytes_for(total_pixels)
            .ok_or_else(|| overflow("packed grid size"))?;
        let bytes_per_packed_grid_rounded =
            round_to_word(bytes_per_packed_grid).ok_or_else(|| overflow("packed grid size"))?;

        let counts = [
            config.input_grids,
            config.persistent_grids,
            config.working_grids,
        ];
        let guard_count = counts
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_add(n))
            .ok_or_else(|| overflow("guard count"))?;

        let grid_bytes = |n: usize, per: usize| n.checked_mul(per);
        let total_bytes = grid_bytes(counts[0], bytes_per_packed_grid_rounded)
            .and_then(|acc| acc.checked_add(grid_bytes(counts[1], bytes_per_grid_rounded)?))
            .and_then(|acc| acc.checked_add(grid_bytes(counts[2], bytes_per_grid_rounded)?))
            .and_then(|acc| acc.checked_add(guard_count.checked_mul(WORD_BYTES)?))
            .ok_or_else(|| overflow("arena size"))?;

        let grc_entries = (total_pixels / 2).min(GRC_MAX_ENTRIES);
        let grc_bytes = grc_entries * std::mem::size_of::<Coord>();
        let grz_entries = if grc_bytes < GRZ_DOUBLE_THRESHOLD_BYTES {
            grc_entries * 2
        } else {
            grc_entries
        };

        Ok(Self {
            rows: config.rows,
            cols: config.cols,
            total_pixels,
            counts,
            encoding: config.encoding,
            bytes_per_grid,
            bytes_per_grid_rounded,
            bytes_per_packed_grid,
            bytes_per_packed_grid_rounded,
            guard_count,
            total_bytes,
            grc_entries,
            grz_entries,
        })
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Pixels per grid.
    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }

    /// Input grid pixel representation.
    pub fn encoding(&self) -> PixelEncoding {
        self.encoding
    }

    /// Pixel representation of grids of `kind`.
    pub fn encoding_of(&self, kind: GridKind) -> PixelEncoding {
        match kind {
            GridKind::Input => self.encoding,
            GridKind::Persistent | GridKind::Working => PixelEncoding::Unpacked,
        }
    }

    /// Number of grids of `kind`.
    pub fn count(&self, kind: GridKind) -> usize {
        self.counts[kind.index()]
    }

    /// Total grid count across all pools.
    pub fn grid_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Unpacked bytes per grid, before rounding.
    pub fn bytes_per_grid(&self) -> usize {
        self.bytes_per_grid
    }

    /// Unpacked bytes per grid, rounded to a word boundary.
    pub fn bytes_per_grid_rounded(&self) -> usize {
        self.bytes_per_grid_rounded
    }

    /// Bytes of pixel data in a grid of `kind`.
    ///
    /// This is the length of the slice handed out for the grid; word
    /// padding is not included.
    pub fn grid_len(&self, kind: GridKind) -> usize {
        match kind {
            GridKind::Input => self.bytes_per_packed_grid,
            GridKind::Persistent | GridKind::Working => self.bytes_per_grid,
        }
    }

    /// Bytes a grid of `kind` occupies in the arena, padding included.
    pub fn slot_bytes(&self, kind: GridKind) -> usize {
        match kind {
            GridKind::Input => self.bytes_per_packed_grid_rounded,
            GridKind::Persistent | GridKind::Working => self.bytes_per_grid_rounded,
        }
    }

    /// Size of a grid of `kind` in words.
    pub fn grid_words(&self, kind: GridKind) -> usize {
        self.slot_bytes(kind) / WORD_BYTES
    }

    /// Number of guard words: one per grid plus the trailing one.
    pub fn guard_count(&self) -> usize {
        self.guard_count
    }

    /// Size of the whole arena block in bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Capacity of the step growth accumulator.
    pub fn grc_entries(&self) -> usize {
        self.grc_entries
    }

    /// Bytes of one step accumulator coordinate array.
    pub fn grc_bytes(&self) -> usize {
        self.grc_entries * std::mem::size_of::<Coord>()
    }

    /// Capacity of the cumulative growth accumulator.
    pub fn grz_entries(&self) -> usize {
        self.grz_entries
    }

    /// Road column capacity for `road_pixels` road pixels.
    pub fn road_columns(&self, road_pixels: usize) -> usize {
        road_pixels.saturating_add(ROAD_COLUMN_SLACK)
    }

    /// Every computed constant, in a fixed order.
    pub fn report(&self) -> LayoutReport {
        let mut entries = IndexMap::new();
        entries.insert("rows", self.rows);
        entries.insert("cols", self.cols);
        entries.insert("total_pixels", self.total_pixels);
        for kind in GridKind::ALL {
            entries.insert(count_label(kind), self.count(kind));
        }
        entries.insert("bytes_per_word", WORD_BYTES);
        entries.insert("bytes_per_grid", self.bytes_per_grid);
        entries.insert("bytes_per_grid_rounded", self.bytes_per_grid_rounded);
        entries.insert("words_per_grid", self.bytes_per_grid_rounded / WORD_BYTES);
        if self.encoding.is_packed() {
            entries.insert("bits_per_packed_pixel", self.encoding.bits_per_pixel());
            entries.insert("bytes_per_packed_grid", self.bytes_per_packed_grid);
            entries.insert(
                "bytes_per_packed_grid_rounded",
                self.bytes_per_packed_grid_rounded,
            );
        }
        for kind in GridKind::ALL {
            entries.insert(size_label(kind), self.grid_words(kind));
        }
        entries.insert("guard_words", 1);
        entries.insert("guard_count", self.guard_count);
        entries.insert("total_bytes", self.total_bytes);
        entries.insert("grc_entries", self.grc_entries);
        entries.insert("grc_bytes", self.grc_bytes());
        entries.insert("grz_entries", self.grz_entries);
        entries.insert("road_rows", self.rows);
        entries.insert("road_column_slack", ROAD_COLUMN_SLACK);
        LayoutReport { entries }
    }
}

fn count_label(kind: GridKind) -> &'static str {
    match kind {
        GridKind::Input => "igrid_count",
        GridKind::Persistent => "pgrid_count",
        GridKind::Working => "wgrid_count",
    }
}

fn size_label(kind: GridKind) -> &'static str {
    match kind {
        GridKind::Input => "igrid_size_words",
        GridKind::Persistent => "pgrid_size_words",
        GridKind::Working => "wgrid_size_words",
    }
}

/// Ordered `(name, value)` listing of a [`Layout`].
///
/// Displays as one `name = value` line per entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutReport {
    entries: IndexMap<&'static str, usize>,
}

impl LayoutReport {
    /// Value of the named entry.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries.get(name).copied()
    }

    /// Entries in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}
