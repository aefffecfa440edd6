#![deny(missing_docs)]

//! # VByte Integer Codec
//!
//! `vbyte` packs sequences of unsigned 32- or 64-bit integers into a compact
//! stream of variable-length byte groups (7 value bits per byte, high bit set
//! while more bytes follow) and answers queries on the compressed stream:
//! whole-stream decode, random access by index and search.
//!
//! ## Usage Example
//!
//! ```
//! use vbyte::{codec, search, select};
//!
//! let values: Vec<u32> = (0..16).map(|i| i * 7).collect();
//!
//! // Sorted streams store the differences between consecutive values
//! let compressed = codec::encode_sorted(&values);
//! assert_eq!(compressed.len(), 16);
//!
//! let mut decoded = vec![0u32; values.len()];
//! codec::uncompress_sorted(&compressed, &mut decoded);
//! assert_eq!(decoded, values);
//!
//! assert_eq!(select::select_sorted::<u32>(&compressed, 15), 105);
//! assert_eq!(search::search_sorted_lower_bound(&compressed, 16, 50u32), (8, Some(56)));
//! ```
//!
//! ## Architecture
//!
//! * **VarInt**: encode and decode a single group
//! * **Codec**: compress and uncompress whole sequences, sorted or unsorted
//! * **Table**: the 65536-entry lookup table describing 16-byte blocks
//! * **Decode**: interchangeable bulk decoders built on the table
//! * **Select** and **Search**: queries that skip whole blocks
//! * **Engine**: a configured front end over all of the above
//!
//! The stream carries no header. The element count, the width and the layout
//! must be known by whoever reads it.

pub mod codec;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod search;
pub mod select;
pub mod simd;
pub mod table;
pub mod varint;

#[cfg(test)]
mod tests;

pub use codec::Layout;
pub use decode::{BulkDecoder, Strategy};
pub use engine::Engine;
pub use error::Error;
pub use varint::VarInt;

/// Builds the block lookup table and detects the CPU features ahead of first use.
///
/// Both happen lazily anyway; calling this at startup moves the cost out of
/// the first query.
pub fn init() {
    let _ = table::block_table();
    let _ = simd::capabilities();
}
