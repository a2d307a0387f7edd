//! Pixel, coordinate and sentinel constants.

/// One unpacked pixel value.
pub type Pixel = u8;

/// A row or column index stored in the growth and road index arrays.
///
/// Two bytes per entry, matching the storage the sizing rules assume.
pub type Coord = u16;

/// Width of a memory word in bytes.
///
/// Grid buffers are rounded up to this boundary and each guard word
/// occupies exactly one word.
pub const WORD_BYTES: usize = 4;

/// The sentinel pattern written into guard words.
pub const INVALID_WORD: u32 = 0xAAAA_AAAA;

/// The sentinel pattern as seen by a single byte of a released grid.
pub const INVALID_PIXEL: Pixel = 0xAA;
