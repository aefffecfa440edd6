//! # Random Access
//!
//! `select` returns the value at a logical position straight from the
//! compressed stream. The baseline functions decode group by group from the
//! start. The accelerated ones classify the stream sixteen bytes at a time
//! and step over every block whose groups all lie before the target, using
//! only the block table entry. For the sorted layout a skipped block still
//! contributes its delta sum, which is rebuilt from the table's group lengths
//! without per-byte continuation checks.
//!
//! The index must be smaller than the number of values in `input`. A larger
//! index panics on a slice bound or returns an unspecified value.

use crate::table::{self, block_table, BlockEntry, BLOCK_SIZE};
use crate::varint::VarInt;

/// Returns the value at `index` of an unsorted stream, skipping whole blocks.
pub fn select_unsorted<T: VarInt>(input: &[u8], index: usize) -> T {
    select_unsorted_with(input, index, table::continuation_mask)
}

/// Returns the value at `index` of a sorted stream, skipping whole blocks.
pub fn select_sorted<T: VarInt>(input: &[u8], index: usize) -> T {
    select_sorted_with(input, index, table::continuation_mask)
}

/// Returns the value at `index` of an unsorted stream by decoding every group
/// before it.
pub fn select_unsorted_scalar<T: VarInt>(input: &[u8], index: usize) -> T {
    let position = skip_groups::<T>(input, 0, index);
    T::decode(&input[position..]).0
}

/// Returns the value at `index` of a sorted stream by summing every delta up
/// to it.
pub fn select_sorted_scalar<T: VarInt>(input: &[u8], index: usize) -> T {
    sum_groups(input, 0, T::ZERO, index + 1).0
}

pub(crate) fn select_unsorted_with<T, M>(input: &[u8], mut index: usize, mask_of: M) -> T
where
    T: VarInt,
    M: Fn(&[u8]) -> u16,
{
    let table = block_table();
    let mut position = 0;

    while position + BLOCK_SIZE <= input.len() {
        let block = &input[position..position + BLOCK_SIZE];
        let entry = table.entry(mask_of(block));
        let num_ints = entry.num_ints as usize;

        if !entry.fits(T::MAX_BYTES) {
            break;
        }
        if index < num_ints {
            let offset: usize = entry.group_lengths().take(index).sum();
            let length = entry.lengths[index] as usize;
            return T::from_group(&block[offset..offset + length]);
        }

        position += entry.num_bytes as usize;
        index -= num_ints;
    }

    let position = skip_groups::<T>(input, position, index);
    T::decode(&input[position..]).0
}

pub(crate) fn select_sorted_with<T, M>(input: &[u8], mut index: usize, mask_of: M) -> T
where
    T: VarInt,
    M: Fn(&[u8]) -> u16,
{
    let table = block_table();
    let mut position = 0;
    let mut previous = T::ZERO;

    while position + BLOCK_SIZE <= input.len() {
        let block = &input[position..position + BLOCK_SIZE];
        let mask = mask_of(block);
        let entry = table.entry(mask);
        let num_ints = entry.num_ints as usize;

        if !entry.fits(T::MAX_BYTES) {
            break;
        }
        if index < num_ints {
            return entry
                .group_lengths()
                .take(index + 1)
                .scan(0, |offset, length| {
                    let group = &block[*offset..*offset + length];
                    *offset += length;
                    Some(T::from_group(group))
                })
                .fold(previous, T::wrapping_add);
        }

        previous = previous.wrapping_add(block_delta_sum(block, mask, entry));
        position += entry.num_bytes as usize;
        index -= num_ints;
    }

    sum_groups(input, position, previous, index + 1).0
}

/// Sum of the deltas of the complete groups of `block`, as classified by
/// `mask` and `entry`.
pub(crate) fn block_delta_sum<T: VarInt>(block: &[u8], mask: u16, entry: &BlockEntry) -> T {
    if mask == 0 {
        return block
            .iter()
            .fold(T::ZERO, |sum, &byte| sum.wrapping_add(T::from_byte(byte)));
    }

    let mut offset = 0;
    let mut sum = T::ZERO;
    for length in entry.group_lengths() {
        sum = sum.wrapping_add(T::from_group(&block[offset..offset + length]));
        offset += length;
    }
    sum
}

/// Returns the position after `count` groups starting at `position`.
fn skip_groups<T: VarInt>(input: &[u8], mut position: usize, count: usize) -> usize {
    for _ in 0..count {
        position += T::decode(&input[position..]).1;
    }
    position
}

/// Adds `count` deltas starting at `position` to `previous`, returning the
/// sum and the position after the last group.
fn sum_groups<T: VarInt>(input: &[u8], mut position: usize, mut previous: T, count: usize) -> (T, usize) {
    for _ in 0..count {
        let (delta, length) = T::decode(&input[position..]);
        previous = previous.wrapping_add(delta);
        position += length;
    }
    (previous, position)
}
