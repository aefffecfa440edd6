//! CPU capability detection and the SSE kernels behind the `simd` feature.
//!
//! Detection runs once per process, on first use (or eagerly through
//! [`crate::init`]). When the crate is built without the `simd` feature, or
//! the running CPU lacks the instructions, every function here falls back to
//! the portable implementation and [`Capabilities::available`] is `false`.

use std::sync::LazyLock;

use crate::table;
use crate::varint;

/// The process-wide capability detection result.
static CAPABILITIES: LazyLock<Capabilities> = LazyLock::new(Capabilities::detect);

/// Instruction set extensions usable by the SIMD kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// `_mm_movemask_epi8` block classification.
    pub sse2: bool,
    /// `_mm_cvtepu8_epi32` widening of single-byte groups.
    pub sse41: bool,
}

impl Capabilities {
    fn detect() -> Self {
        let capabilities = Self::probe();
        tracing::debug!(
            sse2 = capabilities.sse2,
            sse41 = capabilities.sse41,
            compiled = cfg!(feature = "simd"),
            "detected SIMD capabilities"
        );
        capabilities
    }

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    fn probe() -> Self {
        Capabilities {
            sse2: is_x86_feature_detected!("sse2"),
            sse41: is_x86_feature_detected!("sse4.1"),
        }
    }

    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    fn probe() -> Self {
        Capabilities::default()
    }

    /// Whether the SIMD decode strategy has a kernel to run at all.
    pub fn available(&self) -> bool {
        self.sse2
    }
}

/// Returns the detected capabilities, probing the CPU on first call.
pub fn capabilities() -> Capabilities {
    *CAPABILITIES
}

/// Computes the continuation mask of a 16-byte block with `pmovmskb` when
/// available.
///
/// ## Panics
/// If `block` is shorter than [`table::BLOCK_SIZE`].
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[inline]
pub fn movemask(block: &[u8]) -> u16 {
    if CAPABILITIES.sse2 {
        sse::movemask(block)
    } else {
        table::continuation_mask(block)
    }
}

/// Computes the continuation mask of a 16-byte block.
///
/// ## Panics
/// If `block` is shorter than [`table::BLOCK_SIZE`].
#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
#[inline]
pub fn movemask(block: &[u8]) -> u16 {
    table::continuation_mask(block)
}

/// Zero-extends each byte of `bytes` into `out`, sixteen at a time with
/// SSE4.1 when available.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub fn widen_u32(bytes: &[u8], out: &mut [u32]) {
    use table::BLOCK_SIZE;

    if !CAPABILITIES.sse41 {
        return varint::widen(bytes, out);
    }

    let count = bytes.len().min(out.len());
    let mut input_chunks = bytes[..count].chunks_exact(BLOCK_SIZE);
    let mut output_chunks = out[..count].chunks_exact_mut(BLOCK_SIZE);
    for (input, output) in (&mut input_chunks).zip(&mut output_chunks) {
        sse::widen_u32(input, output);
    }
    varint::widen(input_chunks.remainder(), output_chunks.into_remainder());
}

/// Zero-extends each byte of `bytes` into `out`.
#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
#[inline]
pub fn widen_u32(bytes: &[u8], out: &mut [u32]) {
    varint::widen(bytes, out)
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod sse {
    use std::arch::x86_64::*;

    use crate::table::BLOCK_SIZE;

    pub fn movemask(block: &[u8]) -> u16 {
        let block = &block[..BLOCK_SIZE];
        // SAFETY: the slice holds 16 readable bytes, the load is unaligned
        // and callers only get here after SSE2 was detected.
        unsafe { movemask_sse2(block.as_ptr()) }
    }

    pub fn widen_u32(input: &[u8], out: &mut [u32]) {
        let input = &input[..BLOCK_SIZE];
        let out = &mut out[..BLOCK_SIZE];
        // SAFETY: both slices hold 16 elements, loads and stores are
        // unaligned and callers only get here after SSE4.1 was detected.
        unsafe { widen_sse41(input.as_ptr(), out.as_mut_ptr()) }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn movemask_sse2(input: *const u8) -> u16 {
        let bytes = _mm_loadu_si128(input as *const __m128i);
        _mm_movemask_epi8(bytes) as u16
    }

    #[target_feature(enable = "sse2", enable = "sse4.1")]
    unsafe fn widen_sse41(input: *const u8, out: *mut u32) {
        let bytes = _mm_loadu_si128(input as *const __m128i);

        let v0 = _mm_cvtepu8_epi32(bytes);
        let v1 = _mm_cvtepu8_epi32(_mm_srli_si128(bytes, 4));
        let v2 = _mm_cvtepu8_epi32(_mm_srli_si128(bytes, 8));
        let v3 = _mm_cvtepu8_epi32(_mm_srli_si128(bytes, 12));

        _mm_storeu_si128(out as *mut __m128i, v0);
        _mm_storeu_si128(out.add(4) as *mut __m128i, v1);
        _mm_storeu_si128(out.add(8) as *mut __m128i, v2);
        _mm_storeu_si128(out.add(12) as *mut __m128i, v3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_capabilities_are_stable() {
        assert_eq!(capabilities(), capabilities());
        if !cfg!(feature = "simd") {
            assert!(!capabilities().available());
        }
    }

    proptest! {
        #[test]
        fn test_movemask_matches_bytewise(block: [u8; 16]) {
            prop_assert_eq!(movemask(&block), table::continuation_mask_bytewise(&block));
        }

        #[test]
        fn test_widen_matches_portable(bytes in proptest::collection::vec(0u8..128, 0..80)) {
            let mut expected = vec![0u32; bytes.len()];
            varint::widen(&bytes, &mut expected);

            let mut actual = vec![0u32; bytes.len()];
            widen_u32(&bytes, &mut actual);

            prop_assert_eq!(actual, expected);
        }
    }
}
