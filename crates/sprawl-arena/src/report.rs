//! The plain-text memory-map log.
//!
//! Written to `<output_dir>/memory.log` when the config asks for it: the
//! layout constants, one line per guard word and grid buffer with absolute
//! addresses, and at the end of a run the Working pool low-water mark.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sprawl_core::Owner;

use crate::error::ArenaError;
use crate::layout::LayoutReport;
use crate::pool::PoolStats;
use crate::storage::Partition;

/// File name of the memory-map log inside the output directory.
pub const MEMORY_LOG_NAME: &str = "memory.log";

/// An open memory-map log.
pub struct MemoryLog {
    path: PathBuf,
    out: BufWriter<File>,
}

impl MemoryLog {
    /// Create (or truncate) `memory.log` in `dir`.
    pub fn create(dir: &Path) -> Result<Self, ArenaError> {
        let path = dir.join(MEMORY_LOG_NAME);
        let file = File::create(&path).map_err(|source| ArenaError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened memory log");
        Ok(Self {
            path,
            out: BufWriter::new(file),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every layout constant as `name = value`.
    pub fn write_layout(&mut self, report: &LayoutReport) -> Result<(), ArenaError> {
        self.section(|out| write!(out, "{report}"))
    }

    /// Write the partition with absolute addresses from `base`.
    pub fn write_partition(&mut self, partition: &Partition, base: usize) -> Result<(), ArenaError> {
        self.section(|out| {
            writeln!(
                out,
                "\nMemory starts at {:#x} and ends at {:#x}",
                base,
                base + partition.end()
            )?;
            for (guard, &offset) in partition.guards().iter().enumerate() {
                writeln!(out, "{:#x} guard[{guard:2}]", base + offset)?;
                if let Some(region) = partition.slots().get(guard) {
                    writeln!(
                        out,
                        "{:#x} {}[{:2}]",
                        base + region.offset,
                        region.kind.label(),
                        region.index
                    )?;
                }
            }
            writeln!(out, "{:#x} end of memory", base + partition.end())
        })
    }

    /// Record a memory check at `site` and its outcome.
    pub fn write_check(&mut self, site: Owner, ok: bool) -> Result<(), ArenaError> {
        self.section(|out| {
            writeln!(out, "MEMORY CHECK at {site}")?;
            if ok {
                writeln!(out, "MEMORY CHECK OK")?;
            } else {
                writeln!(out, "MEMORY CHECK FAILED")?;
            }
            Ok(())
        })
    }

    /// Write the low-water mark of a pool and how far its count could shrink.
    pub fn write_min_free(&mut self, stats: &PoolStats) -> Result<(), ArenaError> {
        self.section(|out| {
            writeln!(
                out,
                "minimum number of free {} grids = {}",
                stats.kind, stats.min_free
            )?;
            writeln!(
                out,
                "for max efficiency of memory usage reduce {} grid count by {}",
                stats.kind, stats.min_free
            )
        })
    }

    fn section(
        &mut self,
        body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    ) -> Result<(), ArenaError> {
        body(&mut self.out)
            .and_then(|()| self.out.flush())
            .map_err(|source| ArenaError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
