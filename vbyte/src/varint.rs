//! # Variable-Byte Integer Groups
//!
//! This module implements the per-integer half of the codec: a single
//! unsigned integer is written as a *group* of 1 to [`VarInt::MAX_BYTES`]
//! bytes, least significant 7-bit digit first.
//!
//! ## Encoding Format
//!
//! Each byte uses:
//! - Lower 7 bits for value data
//! - High bit (0x80) as continuation flag: set on every byte but the last
//!
//! For example, decimal 300 encodes as: [0xAC, 0x02]
//! - 0xAC = 10101100: High bit set (more bytes follow) + bits 0-6 of value
//! - 0x02 = 00000010: High bit clear (final byte) + bits 7-13 of value
//!
//! ## Contracts
//!
//! [`VarInt::encode`] and [`VarInt::decode`] are the unchecked primitives used
//! by every bulk routine in the crate. They never validate the bytes they
//! read: the caller guarantees that the output slice has room for
//! [`VarInt::encoded_size`] bytes and that the input holds a complete group.
//! A short slice panics on the bounds check; a malformed group decodes to an
//! unspecified value. [`VarInt::try_decode`] is the validating counterpart.
//!
//! For `u32` the fifth byte is always treated as the last byte of the group,
//! whatever its continuation bit says; for `u64` the same holds for the tenth.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Error;

/// Number of value bits stored in each byte of a group.
pub const BITS_PER_BYTE: u32 = 7;

/// Bit mask to extract the lower 7 bits (value data) from a group byte.
pub const LOWER_BITS_MASK: u8 = 0x7F;

/// Flag bit indicating that more bytes of the same group follow.
pub const CONTINUATION_FLAG: u8 = 0x80;

/// An unsigned integer width supported by the codec.
///
/// Implemented for `u32` (groups of up to 5 bytes) and `u64` (groups of up
/// to 10 bytes). Every sequence-level operation in the crate is generic over
/// this trait, so a compressed buffer's element width is chosen by the type
/// parameter at the call site.
pub trait VarInt: Copy + Default + Ord + Hash + Debug + Send + Sync + 'static {
    /// Width of the integer in bits.
    const BITS: u32;

    /// Maximum number of bytes a single group can occupy.
    const MAX_BYTES: usize;

    /// Largest payload the final permitted byte may carry without the value
    /// overflowing [`Self::BITS`].
    const LAST_BYTE_MAX: u8;

    /// The additive identity, used as the implicit predecessor of a sorted
    /// sequence.
    const ZERO: Self;

    /// Returns the number of bytes [`VarInt::encode`] would write for `self`.
    fn encoded_size(self) -> usize;

    /// Writes the group for `self` at the start of `out` and returns the
    /// number of bytes written.
    ///
    /// ## Panics
    /// If `out` is shorter than [`VarInt::encoded_size`].
    fn encode(self, out: &mut [u8]) -> usize;

    /// Reads one group from the start of `input`, returning the value and the
    /// number of bytes consumed.
    ///
    /// ## Panics
    /// If `input` ends before the group does.
    fn decode(input: &[u8]) -> (Self, usize);

    /// Reads one group from the start of `input`, rejecting truncated,
    /// over-long and out-of-range groups.
    fn try_decode(input: &[u8]) -> Result<(Self, usize), Error>;

    /// Reconstructs a value from a group whose length is already known, as
    /// reported by the block lookup table. Bytes past [`Self::MAX_BYTES`] are
    /// ignored.
    fn from_group(group: &[u8]) -> Self;

    /// Widens a single byte.
    fn from_byte(byte: u8) -> Self;

    /// Widens a run of single-byte groups into `out`, one value per byte,
    /// using a SIMD kernel where one is compiled in and the CPU supports it.
    fn widen_accelerated(bytes: &[u8], out: &mut [Self]);

    /// Wrapping (modular) addition.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Wrapping (modular) subtraction.
    fn wrapping_sub(self, rhs: Self) -> Self;
}

/// Widens each byte of `bytes` into the matching slot of `out`.
#[inline]
pub fn widen<T: VarInt>(bytes: &[u8], out: &mut [T]) {
    for (slot, &byte) in out.iter_mut().zip(bytes) {
        *slot = T::from_byte(byte);
    }
}

macro_rules! impl_varint {
    ($ty:ty, $max_bytes:expr, $widen:path) => {
        impl VarInt for $ty {
            const BITS: u32 = <$ty>::BITS;
            const MAX_BYTES: usize = $max_bytes;
            const LAST_BYTE_MAX: u8 =
                ((1u16 << (<$ty>::BITS - BITS_PER_BYTE * ($max_bytes - 1))) - 1) as u8;
            const ZERO: Self = 0;

            #[inline]
            fn encoded_size(self) -> usize {
                // Zero still takes one byte, hence the `| 1`.
                let significant_bits = Self::BITS - (self | 1).leading_zeros();
                significant_bits.div_ceil(BITS_PER_BYTE) as usize
            }

            #[inline]
            fn encode(self, out: &mut [u8]) -> usize {
                let mut value = self;
                let mut position = 0;
                while value > LOWER_BITS_MASK as $ty {
                    out[position] = (value as u8 & LOWER_BITS_MASK) | CONTINUATION_FLAG;
                    value >>= BITS_PER_BYTE;
                    position += 1;
                }
                out[position] = value as u8;
                position + 1
            }

            #[inline]
            fn decode(input: &[u8]) -> (Self, usize) {
                let mut value: $ty = 0;
                for position in 0..Self::MAX_BYTES - 1 {
                    let byte = input[position];
                    value |= ((byte & LOWER_BITS_MASK) as $ty) << (BITS_PER_BYTE * position as u32);
                    if byte & CONTINUATION_FLAG == 0 {
                        return (value, position + 1);
                    }
                }

                // The last permitted byte terminates the group unconditionally.
                let last = Self::MAX_BYTES - 1;
                value |= ((input[last] & LOWER_BITS_MASK) as $ty) << (BITS_PER_BYTE * last as u32);
                (value, Self::MAX_BYTES)
            }

            fn try_decode(input: &[u8]) -> Result<(Self, usize), Error> {
                if input.is_empty() {
                    return Err(Error::EmptyInput);
                }

                let mut value: $ty = 0;
                for (position, &byte) in input.iter().enumerate() {
                    let payload = byte & LOWER_BITS_MASK;

                    if position == Self::MAX_BYTES - 1 {
                        if payload > Self::LAST_BYTE_MAX {
                            return Err(Error::ValueOutOfBounds(Self::BITS));
                        }
                        if byte & CONTINUATION_FLAG != 0 {
                            return Err(Error::InvalidContinuation(position));
                        }
                    }

                    value |= (payload as $ty) << (BITS_PER_BYTE * position as u32);

                    if byte & CONTINUATION_FLAG == 0 {
                        return Ok((value, position + 1));
                    }
                }

                Err(Error::IncompleteSequence)
            }

            #[inline]
            fn from_group(group: &[u8]) -> Self {
                group
                    .iter()
                    .take(Self::MAX_BYTES)
                    .enumerate()
                    .fold(0, |value, (position, &byte)| {
                        value | ((byte & LOWER_BITS_MASK) as $ty) << (BITS_PER_BYTE * position as u32)
                    })
            }

            #[inline]
            fn from_byte(byte: u8) -> Self {
                byte as $ty
            }

            #[inline]
            fn widen_accelerated(bytes: &[u8], out: &mut [Self]) {
                $widen(bytes, out)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$ty>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$ty>::wrapping_sub(self, rhs)
            }
        }
    };
}

impl_varint!(u32, 5, crate::simd::widen_u32);
impl_varint!(u64, 10, widen::<u64>);

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, &[0x00] ; "zero")]
    #[test_case(127, &[0x7F] ; "largest single byte")]
    #[test_case(128, &[0x80, 0x01] ; "smallest two byte")]
    #[test_case(300, &[0xAC, 0x02] ; "medium value")]
    #[test_case(16384, &[0x80, 0x80, 0x01] ; "smallest three byte")]
    #[test_case(u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F] ; "u32 max")]
    fn test_encode_u32(value: u32, expected: &[u8]) {
        let mut out = [0u8; 5];
        let written = value.encode(&mut out);
        assert_eq!(&out[..written], expected);
        assert_eq!(value.encoded_size(), expected.len());
    }

    #[test_case(1 << 35, &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01] ; "six byte power of two")]
    #[test_case(u64::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01] ; "u64 max")]
    #[test_case(1 << 63, &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01] ; "top bit only")]
    fn test_encode_u64(value: u64, expected: &[u8]) {
        let mut out = [0u8; 10];
        let written = value.encode(&mut out);
        assert_eq!(&out[..written], expected);
        assert_eq!(value.encoded_size(), expected.len());
    }

    #[test_case(&[0x7F, 0x00] => (127, 1) ; "value with trailing bytes")]
    #[test_case(&[0xAC, 0x02] => (300, 2) ; "medium value")]
    #[test_case(&[0xFF, 0xFF, 0x03] => (65535, 3) ; "max two bytes as three")]
    #[test_case(&[0x80, 0x80, 0x80, 0x80, 0x8F, 0x01] => (0xF000_0000, 5) ; "fifth byte is terminal")]
    fn test_decode_u32(bytes: &[u8]) -> (u32, usize) {
        u32::decode(bytes)
    }

    #[test]
    fn test_decode_u64_tenth_byte_is_terminal() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x81, 0x7F];
        assert_eq!(u64::decode(&bytes), (1 << 63, 10));
    }

    #[test]
    #[should_panic]
    fn test_decode_truncated_group_panics() {
        u32::decode(&[0x80, 0x80]);
    }

    #[test_case(&[] => Err(Error::EmptyInput) ; "empty input")]
    #[test_case(&[0x80] => Err(Error::IncompleteSequence) ; "incomplete byte sequence")]
    #[test_case(&[0x80, 0x80] => Err(Error::IncompleteSequence) ; "truncated multi-byte")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x81] => Err(Error::InvalidContinuation(4)) ; "continuation at fifth byte")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F] => Err(Error::ValueOutOfBounds(32)) ; "exceeds u32")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F] => Ok((u32::MAX, 5)) ; "exactly u32 max")]
    fn test_try_decode_u32(bytes: &[u8]) -> Result<(u32, usize), Error> {
        u32::try_decode(bytes)
    }

    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02] => Err(Error::ValueOutOfBounds(64)) ; "bit 65 set")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x81] => Err(Error::InvalidContinuation(9)) ; "continuation at tenth byte")]
    #[test_case(&[0x80, 0x80, 0x80, 0x80, 0x10] => Ok((1 << 32, 5)) ; "five byte power of two")]
    fn test_try_decode_u64(bytes: &[u8]) -> Result<(u64, usize), Error> {
        u64::try_decode(bytes)
    }

    #[test]
    fn test_last_byte_max() {
        assert_eq!(u32::LAST_BYTE_MAX, 0x0F);
        assert_eq!(u64::LAST_BYTE_MAX, 0x01);
    }

    #[test_case(&[0x05] => 5 ; "single byte")]
    #[test_case(&[0xAC, 0x02] => 300 ; "two bytes")]
    #[test_case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x7F] => u32::MAX ; "extra bytes ignored")]
    fn test_from_group_u32(group: &[u8]) -> u32 {
        u32::from_group(group)
    }

    #[test]
    fn test_widen() {
        let bytes: Vec<u8> = (0..16).map(|i| i * 7).collect();
        let mut out = [0u32; 16];
        widen(&bytes, &mut out);
        assert!(out.iter().zip(&bytes).all(|(&v, &b)| v == b as u32));

        let mut accelerated = [0u32; 16];
        u32::widen_accelerated(&bytes, &mut accelerated);
        assert_eq!(out, accelerated);
    }
}
