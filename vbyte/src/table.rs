//! # Block Lookup Table
//!
//! Compressed bytes are classified sixteen at a time. The high bits of a
//! 16-byte block form a 16-bit *continuation mask* (bit `i` set iff byte `i`
//! has its continuation flag set), and the mask indexes a 65536-entry table
//! that describes the groups ending inside the block:
//!
//! - `num_ints`: how many groups start and end within the block, scanning
//!   from its first byte,
//! - `num_bytes`: how many bytes those groups occupy (16 only when the block
//!   ends exactly on a group boundary),
//! - `lengths`: the byte length of each of those groups, in order,
//! - `longest`: the largest of those lengths.
//!
//! A trailing group that is still open at byte 15 is not counted; callers
//! resume at `num_bytes` and let the next block (or the scalar tail) pick it
//! up.
//!
//! The table is derived by simulating the left-to-right scan for every mask.
//! It is built once, on first use, and is read-only afterwards.

use std::sync::LazyLock;

/// Number of compressed bytes classified per block.
pub const BLOCK_SIZE: usize = 16;

/// Number of distinct continuation masks, and therefore table entries.
pub const TABLE_ENTRIES: usize = 1 << BLOCK_SIZE;

/// The process-wide table, built on first access.
static BLOCK_TABLE: LazyLock<BlockTable> = LazyLock::new(BlockTable::build);

/// Returns the shared block lookup table, building it if needed.
pub fn block_table() -> &'static BlockTable {
    &BLOCK_TABLE
}

/// Description of the groups that end inside one 16-byte block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockEntry {
    /// Number of complete groups in the block.
    pub num_ints: u8,
    /// Number of bytes those groups occupy.
    pub num_bytes: u8,
    /// Byte length of each complete group; entries past `num_ints` are zero.
    pub lengths: [u8; BLOCK_SIZE],
    /// The largest of `lengths`.
    pub longest: u8,
}

impl BlockEntry {
    /// Simulates the continuation-bit scan for one mask.
    pub fn from_mask(mask: u16) -> Self {
        let mut entry = BlockEntry::default();
        let mut pending = 0u8;

        for bit in 0..BLOCK_SIZE {
            pending += 1;
            if mask & (1u16 << bit) == 0 {
                entry.lengths[entry.num_ints as usize] = pending;
                entry.num_ints += 1;
                entry.num_bytes += pending;
                entry.longest = entry.longest.max(pending);
                pending = 0;
            }
        }

        entry
    }

    /// Byte lengths of the complete groups, in order.
    #[inline]
    pub fn group_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.lengths[..self.num_ints as usize]
            .iter()
            .map(|&length| length as usize)
    }

    /// Whether the block path can decode this entry for a type whose groups
    /// are at most `max_bytes` long.
    ///
    /// False when no group ends in the block, or when one runs past
    /// `max_bytes`. The last permitted byte ends a group whatever its
    /// continuation bit says, and only the scalar decoder applies that rule.
    #[inline]
    pub fn fits(&self, max_bytes: usize) -> bool {
        self.num_ints > 0 && usize::from(self.longest) <= max_bytes
    }
}

/// The 65536-entry lookup table keyed by continuation mask.
#[derive(Debug)]
pub struct BlockTable {
    entries: Box<[BlockEntry]>,
}

impl BlockTable {
    /// Builds the table for every possible mask.
    pub fn build() -> Self {
        let entries: Box<[BlockEntry]> = (0..TABLE_ENTRIES)
            .map(|mask| BlockEntry::from_mask(mask as u16))
            .collect();

        tracing::debug!(entries = entries.len(), "built block lookup table");

        BlockTable { entries }
    }

    /// Returns the entry for `mask`.
    #[inline]
    pub fn entry(&self, mask: u16) -> &BlockEntry {
        &self.entries[mask as usize]
    }
}

/// Gathers the high bit of each of the eight bytes of `word` into the low
/// eight bits of the result (bit `i` from byte `i`).
#[inline]
fn high_bits(word: u64) -> u16 {
    const HIGH_BITS: u64 = 0x8080_8080_8080_8080;
    // Moves bit 7 of byte i to bit 56 + i; the partial products never carry
    // into each other.
    const GATHER: u64 = 0x0002_0408_1020_4081;
    ((word & HIGH_BITS).wrapping_mul(GATHER) >> 56) as u16
}

/// Computes the continuation mask of the first [`BLOCK_SIZE`] bytes of
/// `block` without SIMD instructions.
///
/// ## Panics
/// If `block` is shorter than [`BLOCK_SIZE`].
#[inline]
pub fn continuation_mask(block: &[u8]) -> u16 {
    let block = &block[..BLOCK_SIZE];
    let word = |offset: usize| u64::from_le_bytes(std::array::from_fn(|i| block[offset + i]));
    high_bits(word(0)) | (high_bits(word(BLOCK_SIZE / 2)) << 8)
}

/// Reference implementation of [`continuation_mask`], one byte at a time.
#[cfg(test)]
pub(crate) fn continuation_mask_bytewise(block: &[u8]) -> u16 {
    block[..BLOCK_SIZE]
        .iter()
        .enumerate()
        .filter(|(_, &byte)| byte & crate::varint::CONTINUATION_FLAG != 0)
        .fold(0u16, |mask, (bit, _)| mask | (1u16 << bit))
}
