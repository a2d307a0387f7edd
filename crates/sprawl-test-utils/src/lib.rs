//! Test fixtures and helpers for sprawl development.
//!
//! Provides standard arena configurations, a synthetic road grid builder,
//! and a one-shot tracing subscriber for tests that want to see arena logs
//! (`RUST_LOG=sprawl_arena=debug cargo test`).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Once;

use sprawl_arena::{ArenaConfig, CheckLevel, Diagnostics};
use sprawl_core::Pixel;
use tempfile::TempDir;

/// Rows and columns of the reference scenario.
pub const SCENARIO_DIM: usize = 100;

/// The reference scenario: 100x100 grid, 3 Input, 7 Persistent, 6 Working.
pub fn scenario_config() -> ArenaConfig {
    ArenaConfig::new(SCENARIO_DIM, SCENARIO_DIM).with_grid_counts(3, 7, 6)
}

/// A tiny arena for fast unit-style checks: `rows` x `cols`, one grid of
/// each static kind and `working` Working grids.
pub fn small_config(rows: usize, cols: usize, working: usize) -> ArenaConfig {
    ArenaConfig::new(rows, cols).with_grid_counts(1, 1, working)
}

/// `config` with the given check level and the default pixel maximum.
pub fn with_level(config: ArenaConfig, level: CheckLevel) -> ArenaConfig {
    config.with_diagnostics(Diagnostics {
        level,
        ..Diagnostics::default()
    })
}

/// A fresh temporary output directory, removed on drop.
pub fn temp_output_dir() -> TempDir {
    match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("cannot create temporary output directory: {e}"),
    }
}

/// A row-major `rows` x `cols` grid with road pixels (value 1) at `roads`.
pub fn road_grid(rows: usize, cols: usize, roads: &[(usize, usize)]) -> Vec<Pixel> {
    let mut grid = vec![0; rows * cols];
    for &(r, c) in roads {
        grid[r * cols + c] = 1;
    }
    grid
}

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_counts() {
        let config = scenario_config();
        assert_eq!(config.total_pixels(), 10_000);
        assert_eq!(
            (config.input_grids, config.persistent_grids, config.working_grids),
            (3, 7, 6)
        );
    }

    #[test]
    fn road_grid_marks_roads() {
        let grid = road_grid(2, 3, &[(1, 2)]);
        assert_eq!(grid, vec![0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
