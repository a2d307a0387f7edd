//! Sprawl: fixed-layout grid memory for urban-growth cellular automata.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! sprawl sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use sprawl::prelude::*;
//!
//! let config = ArenaConfig::new(64, 64).with_grid_counts(3, 7, 4);
//! let mut arena = GridArena::new(config).unwrap();
//!
//! // Layers that live for the whole run.
//! let urban = arena.acquire(GridKind::Persistent, owner!("init")).unwrap();
//!
//! // One growth step borrowing a scratch grid.
//! let scratch = arena.acquire(GridKind::Working, owner!("spread")).unwrap();
//! arena.grid_mut(&scratch).unwrap()[64 * 10 + 5] = 1;
//! arena.growth_mut().step_mut().push(10, 5).unwrap();
//! arena.release(scratch, owner!("spread")).unwrap();
//!
//! arena.growth_mut().commit_step().unwrap();
//! arena.check_memory(owner!("end_of_year")).unwrap();
//! assert_eq!(arena.growth().cumulative().count(), 1);
//! # let _ = urban;
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `sprawl-arena` | Layout, pools, guards, growth accumulators, road index |
//! | [`types`] | `sprawl-core` | Grid kinds, owner records, pixel types and sentinels |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Grid arena, pools and auxiliary indices (`sprawl-arena`).
pub use sprawl_arena as arena;

/// Grid kinds, owner records and pixel constants (`sprawl-core`).
pub use sprawl_core as types;

/// Common imports for typical sprawl usage.
///
/// ```rust
/// use sprawl::prelude::*;
/// ```
pub mod prelude {
    // Core vocabulary
    pub use sprawl_core::{owner, Coord, GridKind, Owner, Pixel};

    // Arena
    pub use sprawl_arena::{
        ArenaConfig, CheckLevel, Diagnostics, GridArena, GridHandle, PixelEncoding,
    };

    // Errors
    pub use sprawl_arena::{ArenaError, ErrorKind, FailFast};
}
