//! Benchmark profiles and utilities for the sprawl grid arena.
//!
//! Provides pre-built [`ArenaConfig`] profiles for benchmarking and examples:
//!
//! - [`reference_profile`]: 100x100 grid (10K pixels), 3/7/6 grids
//! - [`stress_profile`]: 2000x2000 grid (4M pixels), 6/7/12 grids
//! - [`synthetic_roads`]: deterministic road grid via seed
//! - [`init_logging`]: `RUST_LOG`-driven subscriber for the example drivers

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use sprawl_arena::ArenaConfig;
use sprawl_core::Pixel;

/// Build a reference benchmark profile: 100x100 grid (10K pixels).
///
/// 3 Input, 7 Persistent and 6 Working grids.
pub fn reference_profile() -> ArenaConfig {
    ArenaConfig::new(100, 100).with_grid_counts(3, 7, 6)
}

/// Build a stress benchmark profile: 2000x2000 grid (4M pixels).
///
/// Twice the Working grids of [`reference_profile`], and the full default
/// set of Input layers.
pub fn stress_profile() -> ArenaConfig {
    ArenaConfig::new(2000, 2000).with_grid_counts(6, 7, 12)
}

/// Generate a deterministic road grid.
///
/// Draws a horizontal road every `spacing` rows and a vertical road every
/// `spacing` columns, each offset by a simple hash of the seed. Returns a
/// row-major grid where road pixels are 1.
pub fn synthetic_roads(rows: usize, cols: usize, spacing: usize, seed: u64) -> Vec<Pixel> {
    let spacing = spacing.max(1);
    let hash = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    let row_offset = (hash % spacing as u64) as usize;
    let col_offset = ((hash >> 32) % spacing as u64) as usize;

    let mut grid = vec![0; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            if r % spacing == row_offset || c % spacing == col_offset {
                grid[r * cols + c] = 1;
            }
        }
    }
    grid
}

/// Install a `RUST_LOG`-driven fmt subscriber, defaulting to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
