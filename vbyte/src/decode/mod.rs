//! # Bulk Decode Engine
//!
//! Turns a compressed stream back into a full output slice. Every decoder
//! implements [`BulkDecoder`] with the same contract as
//! [`crate::codec::uncompress_unsorted`] and
//! [`crate::codec::uncompress_sorted`]: `out.len()` values are decoded and
//! the number of input bytes consumed is returned. For the same well-formed
//! input all decoders produce identical output.
//!
//! [`Strategy`] enumerates the decoders so that callers (the engine, the
//! benchmark harness, tests) can choose one at runtime or iterate over all
//! of them.

mod block;
mod scalar;
mod simd;

use std::sync::Once;

use serde::{Deserialize, Serialize};

pub use block::BlockDecoder;
pub use scalar::ScalarDecoder;
pub use simd::SimdDecoder;

use crate::codec::Layout;
use crate::varint::VarInt;

/// A whole-stream decoder.
pub trait BulkDecoder {
    /// Short, stable name used in logs and benchmark output.
    fn name(&self) -> &'static str;

    /// Decodes `out.len()` absolute values and returns the bytes consumed.
    ///
    /// ## Panics
    /// If `input` ends before `out.len()` groups were read.
    fn uncompress_unsorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize;

    /// Decodes `out.len()` delta-coded values and returns the bytes consumed.
    ///
    /// ## Panics
    /// If `input` ends before `out.len()` groups were read.
    fn uncompress_sorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize;

    /// Decodes in the given layout.
    fn uncompress<T: VarInt>(&self, layout: Layout, input: &[u8], out: &mut [T]) -> usize {
        match layout {
            Layout::Unsorted => self.uncompress_unsorted(input, out),
            Layout::Sorted => self.uncompress_sorted(input, out),
        }
    }
}

/// The available decoders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One group at a time.
    Scalar,
    /// Sixteen bytes at a time through the block lookup table.
    #[default]
    Block,
    /// The block decoder with SSE classification and widening.
    Simd,
}

impl Strategy {
    /// Every strategy, in order of increasing sophistication.
    pub const ALL: [Strategy; 3] = [Strategy::Scalar, Strategy::Block, Strategy::Simd];

    /// The strategy that will actually run: [`Strategy::Simd`] degrades to
    /// [`Strategy::Block`] when no SIMD kernel is available, with a warning
    /// logged the first time.
    pub fn effective(self) -> Strategy {
        static SIMD_UNAVAILABLE: Once = Once::new();

        if self == Strategy::Simd && !crate::simd::capabilities().available() {
            SIMD_UNAVAILABLE.call_once(|| {
                tracing::warn!(
                    compiled = cfg!(feature = "simd"),
                    "SIMD decoding requested but not available; falling back to the block decoder"
                );
            });
            return Strategy::Block;
        }

        self
    }
}

impl BulkDecoder for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Scalar => ScalarDecoder.name(),
            Strategy::Block => BlockDecoder.name(),
            Strategy::Simd => SimdDecoder.name(),
        }
    }

    fn uncompress_unsorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        match self {
            Strategy::Scalar => ScalarDecoder.uncompress_unsorted(input, out),
            Strategy::Block => BlockDecoder.uncompress_unsorted(input, out),
            Strategy::Simd => SimdDecoder.uncompress_unsorted(input, out),
        }
    }

    fn uncompress_sorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        match self {
            Strategy::Scalar => ScalarDecoder.uncompress_sorted(input, out),
            Strategy::Block => BlockDecoder.uncompress_sorted(input, out),
            Strategy::Simd => SimdDecoder.uncompress_sorted(input, out),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
