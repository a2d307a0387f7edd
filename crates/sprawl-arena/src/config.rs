//! Arena configuration parameters.

use std::path::PathBuf;

use sprawl_core::Coord;

use crate::error::ArenaError;
use crate::layout::PixelEncoding;

/// How much checking the arena does beyond its pool accounting.
///
/// Independent of the pool logic: acquire/release accounting errors are
/// always detected, whatever the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// `check_memory` is a no-op. Explicit `verify_all` still works.
    Off,
    /// `check_memory` verifies guard words and the pixel range of in-use
    /// Working grids.
    Guards,
    /// Everything in `Guards`, plus: released Working grids are refilled
    /// with the invalid pattern, and are verified to still hold it when
    /// re-acquired and on every `check_memory`.
    Strict,
}

/// Diagnostic settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    /// Check level. Default: [`CheckLevel::Guards`].
    pub level: CheckLevel,
    /// Largest pixel value an in-use Working grid may hold.
    ///
    /// Default: 255 (every byte value). Lower it to the largest class code a
    /// scenario uses to make the range check catch stray values.
    pub max_pixel_value: u8,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            level: CheckLevel::Guards,
            max_pixel_value: u8::MAX,
        }
    }
}

impl Diagnostics {
    /// Whether the strict (per-pixel invalidation) checks are on.
    pub fn strict(&self) -> bool {
        self.level >= CheckLevel::Strict
    }
}

/// Configuration for the grid arena.
///
/// Supplied once by the scenario layer; the arena is sized from it for the
/// lifetime of the run. Validated at construction.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Number of grid rows.
    pub rows: usize,
    /// Number of grid columns.
    pub cols: usize,
    /// Number of Input grids (read-only layers loaded at startup).
    pub input_grids: usize,
    /// Number of Persistent grids.
    ///
    /// Default: 7 (z, deltatron, delta, land1, land2, cumulate, road state).
    pub persistent_grids: usize,
    /// Number of Working (scratch) grids.
    pub working_grids: usize,
    /// Pixel representation of Input grids.
    pub encoding: PixelEncoding,
    /// Directory receiving `memory.log`.
    pub output_dir: Option<PathBuf>,
    /// Whether to write the memory-map log at construction.
    pub log_memory_map: bool,
    /// Diagnostic checks.
    pub diagnostics: Diagnostics,
}

impl ArenaConfig {
    /// Default Persistent grid count.
    pub const DEFAULT_PERSISTENT_GRIDS: usize = 7;

    /// Default Working grid count.
    pub const DEFAULT_WORKING_GRIDS: usize = 6;

    /// Default Input grid count (urban, road, landuse, excluded, slope, background).
    pub const DEFAULT_INPUT_GRIDS: usize = 6;

    /// Largest row or column count whose indices and per-row road counts
    /// fit in a [`Coord`].
    pub const MAX_DIMENSION: usize = Coord::MAX as usize;

    /// Create a config for a `rows` x `cols` grid.
    ///
    /// Uses default values for all other parameters.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            input_grids: Self::DEFAULT_INPUT_GRIDS,
            persistent_grids: Self::DEFAULT_PERSISTENT_GRIDS,
            working_grids: Self::DEFAULT_WORKING_GRIDS,
            encoding: PixelEncoding::Unpacked,
            output_dir: None,
            log_memory_map: false,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Set the Input, Persistent and Working grid counts.
    pub fn with_grid_counts(mut self, input: usize, persistent: usize, working: usize) -> Self {
        self.input_grids = input;
        self.persistent_grids = persistent;
        self.working_grids = working;
        self
    }

    /// Set the Input grid pixel representation.
    pub fn with_encoding(mut self, encoding: PixelEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Write `memory.log` into `dir` at construction.
    pub fn with_memory_log(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self.log_memory_map = true;
        self
    }

    /// Set the diagnostic checks.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Total pixels per grid.
    pub fn total_pixels(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Check structural invariants.
    ///
    /// Zero dimensions or grid counts are caller contract violations and are
    /// rejected here, before any layout arithmetic runs.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!("grid dimensions must be non-zero (got {}x{})", self.rows, self.cols),
            });
        }
        if self.rows > Self::MAX_DIMENSION || self.cols > Self::MAX_DIMENSION {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "grid dimensions {}x{} exceed the coordinate range (max {})",
                    self.rows,
                    self.cols,
                    Self::MAX_DIMENSION,
                ),
            });
        }
        for (name, count) in [
            ("input", self.input_grids),
            ("persistent", self.persistent_grids),
            ("working", self.working_grids),
        ] {
            if count == 0 {
                return Err(ArenaError::InvalidConfig {
                    reason: format!("{name} grid count must be at least 1"),
                });
            }
        }
        self.encoding.validate()?;
        if self.log_memory_map && self.output_dir.is_none() {
            return Err(ArenaError::InvalidConfig {
                reason: "log_memory_map is set but no output_dir was given".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
