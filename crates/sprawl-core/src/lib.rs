//! Core types for the sprawl grid memory arena.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the arena and its consumers: the three grid pool
//! kinds, typed owner records for diagnosability, and the pixel, coordinate
//! and sentinel constants that the memory layout is built from.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod kind;
pub mod owner;
pub mod pixel;

pub use kind::GridKind;
pub use owner::Owner;
pub use pixel::{Coord, Pixel, INVALID_PIXEL, INVALID_WORD, WORD_BYTES};
