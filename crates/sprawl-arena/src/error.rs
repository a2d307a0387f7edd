//! Arena-specific error types and the fail-fast exit path.
//!
//! Every failure in the arena is fatal to a simulation run: a corrupted or
//! exhausted memory model cannot produce trustworthy output. Operations
//! still return [`ArenaError`] so that tests can assert on structured data;
//! the driver's top level turns any error into a log line and a non-zero
//! exit through [`FailFast::or_exit`].

use std::path::PathBuf;

use sprawl_core::{GridKind, Owner};
use thiserror::Error;

/// Errors that can occur during arena operations.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// The arena block or an auxiliary array could not be obtained.
    #[error("unable to allocate {requested} bytes of memory ({what})")]
    AllocationFailure {
        /// Number of bytes requested.
        requested: usize,
        /// What the allocation was for.
        what: &'static str,
    },

    /// `acquire` on an empty free stack.
    #[error(
        "{kind} grid pool exhausted: all {capacity} grids in use, requested by {requested_by}{}",
        exhaustion_hint(.kind)
    )]
    PoolExhausted {
        /// The pool that ran dry.
        kind: GridKind,
        /// Configured capacity of the pool.
        capacity: usize,
        /// The call site that asked for a grid.
        requested_by: Owner,
    },

    /// A push past the configured capacity of a free stack.
    #[error("{kind} grid free stack overflow: capacity {capacity}")]
    PoolOverflow {
        /// The pool that overflowed.
        kind: GridKind,
        /// Configured capacity of the pool.
        capacity: usize,
    },

    /// `release` with a handle whose buffer is not in the pool's slot table.
    #[error("{kind} grid at offset {offset} does not belong to this arena, released by {released_by}")]
    UnmatchedRelease {
        /// Pool named by the handle.
        kind: GridKind,
        /// Buffer offset carried by the handle.
        offset: usize,
        /// The call site that attempted the release.
        released_by: Owner,
    },

    /// `release` of a slot that is already free, or that was re-acquired
    /// since the handle was issued.
    #[error("{kind} grid {slot} released twice by {released_by}")]
    DoubleRelease {
        /// Pool of the slot.
        kind: GridKind,
        /// Slot index within its pool.
        slot: usize,
        /// The call site that attempted the second release.
        released_by: Owner,
        /// The call site of the earlier release, if recorded.
        previous_release: Option<Owner>,
    },

    /// A guard word no longer holds the invalid pattern.
    #[error(
        "guard word {guard} failed memory check: found {found:#010X}, expected {:#010X}",
        sprawl_core::INVALID_WORD
    )]
    GuardCorruption {
        /// Index of the corrupted guard word.
        guard: usize,
        /// The value read from the guard word.
        found: u32,
        /// The slot whose buffer immediately precedes the guard, if any.
        overrun_slot: Option<(GridKind, usize)>,
        /// Current owner of that slot.
        current_owner: Option<Owner>,
        /// Previous owner of that slot.
        previous_owner: Option<Owner>,
    },

    /// An in-use grid holds a pixel above the configured maximum.
    #[error("{kind} grid {slot} is out of range: pixel {pixel} = {value} exceeds {max}")]
    PixelRangeViolation {
        /// Pool of the grid.
        kind: GridKind,
        /// Slot index within its pool.
        slot: usize,
        /// Index of the first offending pixel.
        pixel: usize,
        /// The offending value.
        value: u8,
        /// The configured maximum pixel value.
        max: u8,
        /// Current owner of the grid.
        current_owner: Option<Owner>,
    },

    /// A released grid was written to after its release.
    #[error("{kind} grid {slot} is not invalid: pixel {pixel} written after release")]
    WriteAfterRelease {
        /// Pool of the grid.
        kind: GridKind,
        /// Slot index within its pool.
        slot: usize,
        /// Index of the first pixel that no longer holds the pattern.
        pixel: usize,
        /// Owner before the release.
        previous_owner: Option<Owner>,
        /// The call site that released the grid.
        released_by: Option<Owner>,
    },

    /// Access through a handle whose grid has been released.
    #[error("stale handle: {kind} grid {slot} is no longer held by this handle")]
    StaleHandle {
        /// Pool of the grid.
        kind: GridKind,
        /// Slot index within its pool.
        slot: usize,
    },

    /// A growth accumulator count beyond its fixed capacity.
    #[error("growth accumulator overflow: {requested} entries, capacity {capacity}")]
    AccumulatorOverflow {
        /// Requested entry count.
        requested: usize,
        /// Fixed capacity of the accumulator.
        capacity: usize,
    },

    /// More road pixels than the road column array can hold.
    #[error("road index overflow: {road_pixels} road pixels, column capacity {capacity}")]
    RoadIndexOverflow {
        /// Road pixels found.
        road_pixels: usize,
        /// Allocated column capacity.
        capacity: usize,
    },

    /// A road grid whose size does not match the road index.
    ///
    /// The grid must hold exactly `rows × cols` pixels, and `cols` must be
    /// between 1 and `Coord::MAX`.
    #[error("road grid of {len} bytes does not fit {rows} rows of {cols} columns")]
    RoadGridShape {
        /// Bytes in the grid passed in.
        len: usize,
        /// Rows of the road index.
        rows: usize,
        /// Columns the grid was declared with.
        cols: usize,
    },

    /// Configuration rejected at the boundary.
    #[error("invalid arena config: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// The memory-map log could not be written.
    #[error("memory log {}: {source}", .path.display())]
    Io {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn exhaustion_hint(kind: &GridKind) -> &'static str {
    match kind {
        GridKind::Working => "; increase the configured working grid count",
        _ => "",
    }
}

/// Discriminant of an [`ArenaError`], for matching without destructuring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ArenaError::AllocationFailure`].
    AllocationFailure,
    /// See [`ArenaError::PoolExhausted`].
    PoolExhausted,
    /// See [`ArenaError::PoolOverflow`].
    PoolOverflow,
    /// See [`ArenaError::UnmatchedRelease`].
    UnmatchedRelease,
    /// See [`ArenaError::DoubleRelease`].
    DoubleRelease,
    /// See [`ArenaError::GuardCorruption`].
    GuardCorruption,
    /// See [`ArenaError::PixelRangeViolation`].
    PixelRangeViolation,
    /// See [`ArenaError::WriteAfterRelease`].
    WriteAfterRelease,
    /// See [`ArenaError::StaleHandle`].
    StaleHandle,
    /// See [`ArenaError::AccumulatorOverflow`].
    AccumulatorOverflow,
    /// See [`ArenaError::RoadIndexOverflow`].
    RoadIndexOverflow,
    /// See [`ArenaError::RoadGridShape`].
    RoadGridShape,
    /// See [`ArenaError::InvalidConfig`].
    InvalidConfig,
    /// See [`ArenaError::Io`].
    Io,
}

impl ArenaError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            Self::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            Self::PoolOverflow { .. } => ErrorKind::PoolOverflow,
            Self::UnmatchedRelease { .. } => ErrorKind::UnmatchedRelease,
            Self::DoubleRelease { .. } => ErrorKind::DoubleRelease,
            Self::GuardCorruption { .. } => ErrorKind::GuardCorruption,
            Self::PixelRangeViolation { .. } => ErrorKind::PixelRangeViolation,
            Self::WriteAfterRelease { .. } => ErrorKind::WriteAfterRelease,
            Self::StaleHandle { .. } => ErrorKind::StaleHandle,
            Self::AccumulatorOverflow { .. } => ErrorKind::AccumulatorOverflow,
            Self::RoadIndexOverflow { .. } => ErrorKind::RoadIndexOverflow,
            Self::RoadGridShape { .. } => ErrorKind::RoadGridShape,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Lines of owner history worth printing after the main message.
    fn owner_history(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self {
            Self::GuardCorruption {
                overrun_slot,
                current_owner,
                previous_owner,
                ..
            } => {
                if let Some((kind, slot)) = overrun_slot {
                    lines.push(format!("overrun from {kind} grid {slot}"));
                }
                if let Some(o) = current_owner {
                    lines.push(format!("current_owner: {o}"));
                }
                if let Some(o) = previous_owner {
                    lines.push(format!("previous_owner: {o}"));
                }
            }
            Self::PixelRangeViolation {
                current_owner: Some(o),
                ..
            } => lines.push(format!("current_owner: {o}")),
            Self::WriteAfterRelease {
                previous_owner,
                released_by,
                ..
            } => {
                if let Some(o) = previous_owner {
                    lines.push(format!("previous_owner: {o}"));
                }
                if let Some(o) = released_by {
                    lines.push(format!("released_by: {o}"));
                }
            }
            Self::DoubleRelease {
                previous_release: Some(o),
                ..
            } => lines.push(format!("previous release: {o}")),
            _ => {}
        }
        lines
    }
}

/// Exit the process on any arena error.
///
/// Implemented for every `Result<T, ArenaError>`. This is the single place
/// where arena failures become process termination.
pub trait FailFast<T> {
    /// Return the value, or log the error and exit with status 1.
    fn or_exit(self) -> T;
}

impl<T> FailFast<T> for Result<T, ArenaError> {
    fn or_exit(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(kind = ?err.kind(), "{err}");
                eprintln!("ERROR: {err}");
                for line in err.owner_history() {
                    tracing::error!("{line}");
                    eprintln!("ERROR: {line}");
                }
                std::process::exit(1);
            }
        }
    }
}
