//! End-to-end growth cycle example.
//!
//! Demonstrates: build config → GridArena → load input layers → index
//! roads → run growth years borrowing Working grids → memory checks →
//! min-free report. Any arena error ends the process with status 1.
//!
//! ```text
//! RUST_LOG=sprawl_arena=debug cargo run -p sprawl-bench --example growth_cycle -- /tmp/out
//! ```

use sprawl_arena::{FailFast, GridArena};
use sprawl_bench::{init_logging, reference_profile, synthetic_roads};
use sprawl_core::{owner, GridKind};

fn main() {
    init_logging();

    let mut config = reference_profile();
    if let Some(dir) = std::env::args().nth(1) {
        config = config.with_memory_log(dir);
    }
    let (rows, cols) = (config.rows, config.cols);
    let mut arena = GridArena::new(config).or_exit();
    tracing::info!(bytes = arena.layout().total_bytes(), "arena ready");

    // --- Inputs: urban seed, roads, slope ---
    let urban = arena.acquire(GridKind::Input, owner!("load_inputs")).or_exit();
    let roads = arena.acquire(GridKind::Input, owner!("load_inputs")).or_exit();
    let slope = arena.acquire(GridKind::Input, owner!("load_inputs")).or_exit();

    let road_grid = synthetic_roads(rows, cols, 9, 7);
    let road_pixels = road_grid.iter().filter(|&&p| p != 0).count();
    arena.grid_mut(&roads).or_exit().copy_from_slice(&road_grid);
    arena.allocate_road_columns(road_pixels).or_exit();
    let indexed = arena.rebuild_road_index(&roads).or_exit();
    tracing::info!(
        road_pixels = indexed,
        rows_with_roads = arena.roads().rows_with_roads().count(),
        "road index built"
    );

    {
        let seed = arena.grid_mut(&urban).or_exit();
        seed.fill(0);
        seed[(rows / 2) * cols + cols / 2] = 1;
    }
    for (i, p) in arena.grid_mut(&slope).or_exit().iter_mut().enumerate() {
        *p = (i % 60) as u8;
    }

    // --- Persistent: cumulative urbanization ---
    let cumulate = arena
        .acquire(GridKind::Persistent, owner!("init_run"))
        .or_exit();
    let seed = arena.grid(&urban).or_exit().to_vec();
    arena.grid_mut(&cumulate).or_exit().copy_from_slice(&seed);
    arena.growth_mut().set_cumulative_grid(Some(cumulate));

    // --- Growth years ---
    for year in 0..10 {
        let z = arena.acquire(GridKind::Working, owner!("grow")).or_exit();
        let delta = arena.acquire(GridKind::Working, owner!("grow")).or_exit();

        let current = arena.grid(&cumulate).or_exit().to_vec();
        arena.grid_mut(&z).or_exit().copy_from_slice(&current);
        arena.grid_mut(&delta).or_exit().fill(0);

        // Spread one pixel east of every urban pixel that sits on a road row.
        let road_rows: Vec<usize> = arena.roads().rows_with_roads().collect();
        for row in road_rows {
            for col in 0..cols - 1 {
                let i = row * cols + col;
                if current[i] == 1 && current[i + 1] == 0 {
                    arena.grid_mut(&delta).or_exit()[i + 1] = 1;
                    arena
                        .growth_mut()
                        .step_mut()
                        .push(row as u16, (col + 1) as u16)
                        .or_exit();
                }
            }
        }

        let new_pixels = arena.growth().step().count();
        let delta_grid = arena.grid(&delta).or_exit().to_vec();
        for (dst, &d) in arena.grid_mut(&cumulate).or_exit().iter_mut().zip(&delta_grid) {
            *dst |= d;
        }
        arena.growth_mut().commit_step().or_exit();

        arena.release(delta, owner!("grow")).or_exit();
        arena.release(z, owner!("grow")).or_exit();
        arena.check_memory(owner!("end_of_year")).or_exit();
        tracing::info!(year, new_pixels, "year complete");
    }

    tracing::info!(
        cumulative = arena.growth().cumulative().count(),
        "run complete"
    );
    arena.log_min_free().or_exit();
    for stats in arena.pool_stats() {
        println!(
            "{:<10} capacity {:>2}  in use {:>2}  min free {:>2}",
            stats.kind.to_string(),
            stats.capacity,
            stats.in_use(),
            stats.min_free
        );
    }
}
