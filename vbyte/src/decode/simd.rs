//! The block decoder wired to the SSE kernels of [`crate::simd`].
//!
//! Block classification uses `pmovmskb` and all-single-byte blocks are
//! widened with `pmovzxbd` (`u32` only). Without the `simd` feature, or on a
//! CPU without SSE2/SSE4.1, both kernels are the portable ones and this
//! decoder behaves exactly like [`super::BlockDecoder`].

use super::block;
use super::BulkDecoder;
use crate::codec::Layout;
use crate::simd;
use crate::varint::VarInt;

/// Block decoder using SIMD classification and widening.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimdDecoder;

impl BulkDecoder for SimdDecoder {
    fn name(&self) -> &'static str {
        "simd"
    }

    fn uncompress_unsorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        block::uncompress(Layout::Unsorted, input, out, simd::movemask, T::widen_accelerated)
    }

    fn uncompress_sorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        block::uncompress(Layout::Sorted, input, out, simd::movemask, T::widen_accelerated)
    }
}
