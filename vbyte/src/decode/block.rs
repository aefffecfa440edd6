//! Table-driven decoding, sixteen compressed bytes at a time.
//!
//! While at least 16 values remain (and therefore at least 16 bytes), the
//! next 16 bytes are classified into a continuation mask. A zero mask means
//! sixteen single-byte groups, which are widened in one step. Any other mask
//! is looked up in the block table and its complete groups are rebuilt from
//! their known lengths. The remaining values are decoded one group at a time.

use super::BulkDecoder;
use crate::codec::Layout;
use crate::table::{self, block_table, BLOCK_SIZE};
use crate::varint::{self, VarInt};

/// Decodes through the block lookup table with the portable classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockDecoder;

impl BulkDecoder for BlockDecoder {
    fn name(&self) -> &'static str {
        "block"
    }

    fn uncompress_unsorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        uncompress(Layout::Unsorted, input, out, table::continuation_mask, varint::widen::<T>)
    }

    fn uncompress_sorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        uncompress(Layout::Sorted, input, out, table::continuation_mask, varint::widen::<T>)
    }
}

/// The block decoding loop, parameterized over the block classifier and the
/// zero-mask widening kernel.
pub(super) fn uncompress<T, M, W>(
    layout: Layout,
    input: &[u8],
    out: &mut [T],
    mask_of: M,
    widen: W,
) -> usize
where
    T: VarInt,
    M: Fn(&[u8]) -> u16,
    W: Fn(&[u8], &mut [T]),
{
    let table = block_table();
    let sorted = layout == Layout::Sorted;

    let mut consumed = 0;
    let mut produced = 0;
    let mut previous = T::ZERO;

    while out.len() - produced >= BLOCK_SIZE {
        let block = &input[consumed..consumed + BLOCK_SIZE];
        let mask = mask_of(block);

        if mask == 0 {
            let slots = &mut out[produced..produced + BLOCK_SIZE];
            widen(block, slots);
            if sorted {
                for slot in slots.iter_mut() {
                    previous = previous.wrapping_add(*slot);
                    *slot = previous;
                }
            }
            consumed += BLOCK_SIZE;
            produced += BLOCK_SIZE;
            continue;
        }

        let entry = table.entry(mask);
        // Groups longer than `T::MAX_BYTES` only occur in malformed input; the
        // scalar tail splits them at the last permitted byte.
        if !entry.fits(T::MAX_BYTES) {
            break;
        }

        let mut offset = 0;
        for length in entry.group_lengths() {
            let mut value = T::from_group(&block[offset..offset + length]);
            if sorted {
                previous = previous.wrapping_add(value);
                value = previous;
            }
            out[produced] = value;
            produced += 1;
            offset += length;
        }
        consumed += entry.num_bytes as usize;
    }

    for slot in out[produced..].iter_mut() {
        let (mut value, length) = T::decode(&input[consumed..]);
        if sorted {
            previous = previous.wrapping_add(value);
            value = previous;
        }
        *slot = value;
        consumed += length;
    }

    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_zero_mask_block_is_widened() {
        let values: Vec<u32> = (0..16).map(|i| i * 7).collect();
        let compressed = codec::encode_sorted(&values);
        assert_eq!(compressed.len(), BLOCK_SIZE);
        assert_eq!(table::continuation_mask(&compressed), 0);

        let mut out = [0u32; 16];
        assert_eq!(BlockDecoder.uncompress_sorted(&compressed, &mut out), BLOCK_SIZE);
        assert_eq!(out.as_slice(), values.as_slice());
    }

    /// Groups that straddle a block boundary are left for the next block.
    #[test]
    fn test_group_straddling_block_boundary() {
        let mut values = vec![1u32; 15];
        values.push(300);
        values.extend([u32::MAX, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17]);
        let compressed = codec::encode_unsorted(&values);

        let mut out = vec![0u32; values.len()];
        assert_eq!(BlockDecoder.uncompress_unsorted(&compressed, &mut out), compressed.len());
        assert_eq!(out, values);
    }

    #[test]
    fn test_wide_groups() {
        let values: Vec<u64> = (0..40).map(|i| u64::MAX >> i).collect();
        let compressed = codec::encode_unsorted(&values);

        let mut out = vec![0u64; values.len()];
        assert_eq!(BlockDecoder.uncompress_unsorted(&compressed, &mut out), compressed.len());
        assert_eq!(out, values);
    }

    /// A sixteen-byte run of continuation bytes cannot come from the encoder;
    /// the decoder hands it to the scalar path rather than looping forever.
    #[test]
    fn test_block_without_complete_group_terminates() {
        let mut input = vec![0x80u8; BLOCK_SIZE];
        input.extend([0u8; BLOCK_SIZE * 2]);

        let mut out = vec![0u32; BLOCK_SIZE + 1];
        let consumed = BlockDecoder.uncompress_unsorted(&input, &mut out);
        assert!(consumed <= input.len());
    }
}
