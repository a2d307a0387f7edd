//! Fixed-layout grid memory for sprawl simulations.
//!
//! Every raster grid a run will ever need is carved out of one block
//! allocated at startup. Grids are handed out and reclaimed through three
//! typed pools, and each buffer is fenced by guard words that expose
//! out-of-bounds writes.
//!
//! # Architecture
//!
//! ```text
//! GridArena (context object, one per run)
//! ├── Layout (sizes derived from ArenaConfig)
//! ├── ArenaStorage (the single Vec<u8> block)
//! ├── Partition (guard and grid offsets, layout order)
//! ├── GridPool × 3 (Input / Persistent / Working free stacks)
//! ├── GuardRegistry (sentinel words before every grid + trailing)
//! ├── GrowthAccumulators (step GRC + cumulative GRZ coordinate lists)
//! ├── RoadIndex (per-row sparse road columns)
//! └── MemoryLog (optional memory.log)
//! ```
//!
//! # Failure model
//!
//! Every [`ArenaError`] is fatal to a run. Operations return `Result` so the
//! failure carries structured data (slot, owners, offsets); the driver turns
//! it into a diagnostic line and exit status 1 with [`FailFast::or_exit`].
//!
//! No `unsafe`: guard words are read and written through byte slices, and
//! grid access goes through bounds-checked slices resolved from handles.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod growth;
pub mod guard;
pub mod handle;
pub mod layout;
pub mod pool;
pub mod report;
pub mod road;
pub mod storage;

// Public re-exports for the primary API surface.
pub use arena::GridArena;
pub use config::{ArenaConfig, CheckLevel, Diagnostics};
pub use error::{ArenaError, ErrorKind, FailFast};
pub use growth::{GrowthAccumulator, GrowthAccumulators};
pub use handle::{ArenaId, GridHandle};
pub use layout::{Layout, LayoutReport, PixelEncoding, ROAD_COLUMN_SLACK};
pub use pool::{GridPool, PoolStats, Slot};
pub use road::RoadIndex;
